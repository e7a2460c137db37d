use chrono::Duration;

/// Detection thresholds and scoring weights.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Smurfing: sliding window width, inclusive on both ends.
    pub smurf_window: Duration,
    /// Smurfing: distinct counterparties needed inside the window.
    pub smurf_min_counterparties: usize,

    /// High velocity: sliding window width, inclusive on both ends.
    pub velocity_window: Duration,
    /// High velocity: total transactions (in + out) within the window.
    pub velocity_threshold: usize,

    /// Shell chains: hop bounds (in edges).
    pub shell_min_hops: usize,
    pub shell_max_hops: usize,
    /// Shell chains: max total transactions for an intermediate account.
    pub shell_max_intermediate_txs: usize,

    /// Cycles: length bounds (in nodes).
    pub cycle_min_len: usize,
    pub cycle_max_len: usize,
    /// Cycles: SCCs larger than this are skipped to bound the worst case.
    pub scc_max_size: usize,

    /// Merchant-like suppression (fan-in).
    pub merchant_min_inbound: usize,
    pub merchant_max_amount_cv: f64,
    pub merchant_min_span: Duration,

    /// Payroll-like suppression (fan-out).
    pub payroll_min_outbound: usize,
    pub payroll_max_amount_cv: f64,
    pub payroll_min_pay_dates: usize,

    /// Per-account score contributions, applied once per pattern.
    pub score_cycle: u32,
    pub score_fan_in: u32,
    pub score_fan_out: u32,
    pub score_shell: u32,
    pub score_high_velocity: u32,
    /// Suspicion scores are capped here after summing.
    pub score_cap: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            smurf_window: Duration::hours(72),
            smurf_min_counterparties: 10,

            velocity_window: Duration::hours(24),
            velocity_threshold: 30,

            shell_min_hops: 3,
            shell_max_hops: 4,
            shell_max_intermediate_txs: 3,

            cycle_min_len: 3,
            cycle_max_len: 5,
            scc_max_size: 100,

            merchant_min_inbound: 300,
            merchant_max_amount_cv: 0.30,
            merchant_min_span: Duration::days(14),

            payroll_min_outbound: 100,
            payroll_max_amount_cv: 0.20,
            payroll_min_pay_dates: 3,

            score_cycle: 40,
            score_fan_in: 30,
            score_fan_out: 30,
            score_shell: 35,
            score_high_velocity: 10,
            score_cap: 100,
        }
    }
}
