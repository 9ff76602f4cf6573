//! Portfolio risk metrics example
//!
//! Simulates a year of daily returns for three assets, computes per-asset
//! metrics and analyzes a weighted portfolio of them.
//!
//! Run with: cargo run --example portfolio_metrics

use ag_riskmetrics::{
    AssetProfile, MarketSimulator, MonteCarloSimulator, PortfolioAnalyzer, PortfolioWeights,
    RiskAssessment, RiskMetricsEngine, RiskScore,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Portfolio Risk Metrics Example ===\n");

    // 1. Simulate a trading year for three assets
    let symbols = ["AAPL", "MSFT", "JNJ"];
    let profiles: Vec<AssetProfile> = symbols.iter().map(|s| AssetProfile::lookup(s)).collect();

    let mut simulator = MarketSimulator::new(42);
    let series = simulator.generate_portfolio(&profiles, 252)?;

    for profile in &profiles {
        println!(
            "  {:<5} vol {:>5.1}%  drift {:>5.1}%",
            profile.symbol,
            profile.annual_volatility * 100.0,
            profile.annual_drift * 100.0
        );
    }
    println!();

    // 2. Per-asset metrics
    let engine = RiskMetricsEngine::default();
    let bands = engine.config().assessment.clone();

    println!("--- Single Asset Metrics ---");
    println!("Asset     Vol    Return  Sharpe   VaR95   CVaR95   MaxDD  Level");
    for s in &series {
        let result = engine.compute_metrics(s)?;
        let assessment = RiskAssessment::from_metrics(&result, &bands);
        println!(
            "{:<6} {:>6.2}% {:>7.2}% {:>7.2} {:>6.2}% {:>7.2}% {:>6.2}%  {:?}",
            s.symbol().unwrap_or("-"),
            result.annualized_volatility * 100.0,
            result.annualized_return * 100.0,
            result.sharpe_ratio,
            result.var_95 * 100.0,
            result.cvar_95 * 100.0,
            result.max_drawdown * 100.0,
            assessment.level
        );
    }
    println!();

    // 3. Weighted portfolio
    let weights = PortfolioWeights::new(vec![("AAPL", 0.5), ("MSFT", 0.3), ("JNJ", 0.2)])?;
    let analyzer = PortfolioAnalyzer::with_engine(engine);
    let report = analyzer.analyze(&series, &weights)?;

    println!("--- Correlation Matrix ---");
    print!("     ");
    for asset in &report.assets {
        print!("  {:>6}", asset);
    }
    println!();
    for (asset, row) in report.assets.iter().zip(&report.correlation_matrix) {
        print!("{:<5}", asset);
        for value in row {
            print!("  {:>6.3}", value);
        }
        println!();
    }
    println!();

    println!("--- Portfolio ---");
    let metrics = &report.metrics;
    println!("  Annualized volatility: {:.2}%", metrics.annualized_volatility * 100.0);
    println!("  Covariance volatility: {:.2}%", report.covariance_volatility * 100.0);
    println!("  Annualized return:     {:.2}%", metrics.annualized_return * 100.0);
    println!("  Sharpe ratio:          {:.3}", metrics.sharpe_ratio);
    println!("  Sortino ratio:         {:.3}", metrics.sortino_ratio);
    println!("  VaR 95% / 99%:         {:.2}% / {:.2}%", metrics.var_95 * 100.0, metrics.var_99 * 100.0);
    println!("  CVaR 95% / 99%:        {:.2}% / {:.2}%", metrics.cvar_95 * 100.0, metrics.cvar_99 * 100.0);
    println!(
        "  Max drawdown:          {:.2}% (day {} to day {})",
        metrics.max_drawdown * 100.0,
        metrics.drawdown.peak_index,
        metrics.drawdown.trough_index
    );
    println!("  Win rate:              {:.1}%", metrics.win_rate * 100.0);
    println!("  Diversification:       {:.1}%", report.diversification_benefit * 100.0);
    println!("  Beta vs equal weight:  {:.3}", report.benchmark.beta);
    println!("  Tracking error:        {:.2}%", report.benchmark.tracking_error * 100.0);
    println!("  Information ratio:     {:.3}", report.benchmark.information_ratio);
    println!();

    println!("--- Risk Contributions ---");
    for c in &report.components {
        println!(
            "  {:<5} weight {:>4.0}%  contribution {:>5.2}%",
            c.asset_id,
            c.weight * 100.0,
            c.risk_contribution * 100.0
        );
    }
    println!();

    let assessment = RiskAssessment::from_metrics(metrics, &bands);
    println!("Assessment: {:?} ({})", assessment.level, assessment.color);
    println!("  {}", assessment.summary);
    println!("  {}", assessment.action);
    println!();

    let score = RiskScore::from_metrics(metrics, &bands);
    println!("Risk score: {:.1}/10 {:?} ({})", score.score, score.level, score.color);
    for recommendation in &score.recommendations {
        println!("  - {}", recommendation);
    }
    println!();

    // 4. Project 30 trading days ahead
    let projection = MonteCarloSimulator::default().simulate(&series, &weights)?;
    println!("--- Monte Carlo ({} paths, {} days) ---", projection.simulations, projection.horizon_days);
    println!("  Mean final value:      {:.2}", projection.mean_final_value);
    println!("  Expected return:       {:.2}%", projection.expected_return * 100.0);
    println!("  VaR / CVaR 95%:        {:.2} / {:.2}", projection.var_95, projection.cvar_95);
    println!(
        "  95% interval:          {:.2} to {:.2}",
        projection.confidence_interval_95.0, projection.confidence_interval_95.1
    );
    println!("  P(loss):               {:.1}%", projection.probability_loss * 100.0);
    println!("  P(gain > 10%):         {:.1}%", projection.probability_gain_10 * 100.0);

    println!("\n=== Example Complete ===");
    Ok(())
}
