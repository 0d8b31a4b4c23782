//! Closed-form steady-state results.
//!
//! Pure functions of the fixed parameters. Each branch checks its own
//! stability or validity precondition and returns
//! UndefinedTheoreticalResult instead of a misleading number.

use crate::error::{require_count, require_non_negative, require_positive, SimError, SimResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QueueTheory {
    /// ρ = λ / (cμ)
    pub utilization: f64,
    /// Probability the system is empty.
    pub p0:          f64,
    /// Mean number waiting.
    pub lq:          f64,
    /// Mean number in system.
    pub l:           f64,
    pub wq:          f64,
    pub w:           f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulationTheory {
    /// π(i) for i failed units, i = 0..=N. Sums to 1.
    pub pi:           Vec<f64>,
    pub availability: f64,
    pub mean_failed:  f64,
    pub utilization:  f64,
}

/// M/M/1 or M/M/c depending on the server count.
pub fn queue_steady_state(lambda: f64, mu: f64, servers: u32) -> SimResult<QueueTheory> {
    if servers == 1 {
        mm1(lambda, mu)
    } else {
        mmc(lambda, mu, servers)
    }
}

/// Single server. Stable iff λ < μ.
pub fn mm1(lambda: f64, mu: f64) -> SimResult<QueueTheory> {
    require_non_negative("arrival_rate", lambda)?;
    require_positive("service_rate", mu)?;
    if lambda >= mu {
        return Err(SimError::undefined(
            "M/M/1",
            format!("unstable: λ={lambda} >= μ={mu}"),
        ));
    }
    let rho = lambda / mu;
    Ok(QueueTheory {
        utilization: rho,
        p0:          1.0 - rho,
        lq:          rho * rho / (1.0 - rho),
        l:           rho / (1.0 - rho),
        wq:          lambda / (mu * (mu - lambda)),
        w:           1.0 / (mu - lambda),
    })
}

/// Erlang-C for c > 1 servers. Stable iff λ / (cμ) < 1.
pub fn mmc(lambda: f64, mu: f64, servers: u32) -> SimResult<QueueTheory> {
    require_non_negative("arrival_rate", lambda)?;
    require_positive("service_rate", mu)?;
    require_count("servers", servers)?;

    let c = servers as f64;
    let rho = lambda / (c * mu);
    if rho >= 1.0 {
        return Err(SimError::undefined(
            format!("M/M/{servers}"),
            format!("unstable: ρ=λ/(cμ)={rho:.4} >= 1"),
        ));
    }

    let offered = c * rho;
    // ln(a^k / k!) for k = 0..=c, built term by term so that neither the
    // power nor the factorial is ever formed.
    let mut log_terms = Vec::with_capacity(servers as usize + 1);
    let mut log_term = 0.0_f64;
    log_terms.push(log_term);
    for k in 1..=servers {
        log_term += (offered / k as f64).ln();
        log_terms.push(log_term);
    }
    let log_last = log_term;
    let log_tail = log_last - (1.0 - rho).ln();

    // log-sum-exp of the head terms (k < c) and the tail.
    let peak = log_terms[..servers as usize]
        .iter()
        .copied()
        .fold(log_tail, f64::max);
    let scaled: f64 = log_terms[..servers as usize]
        .iter()
        .map(|l| (l - peak).exp())
        .sum::<f64>()
        + (log_tail - peak).exp();
    let log_norm = peak + scaled.ln();

    let p0 = (-log_norm).exp();
    let lq = (log_last + rho.ln() - 2.0 * (1.0 - rho).ln() - log_norm).exp();
    if !p0.is_finite() || !lq.is_finite() {
        return Err(SimError::undefined(
            format!("M/M/{servers}"),
            format!("Erlang-C terms are not finite: p0={p0}, Lq={lq}"),
        ));
    }

    // No arrivals means nobody ever waits.
    let wq = if lambda > 0.0 { lq / lambda } else { 0.0 };
    let w = wq + 1.0 / mu;

    Ok(QueueTheory {
        utilization: rho,
        p0,
        lq,
        l: lq + lambda / mu,
        wq,
        w,
    })
}

/// Finite birth–death chain of the repair system:
/// birth(k) = (N−k)λ, death(k) = min(k, teams)μ.
pub fn birth_death_steady_state(
    machines: u32,
    failure_rate: f64,
    repair_rate: f64,
    teams: u32,
) -> SimResult<PopulationTheory> {
    require_count("machines", machines)?;
    require_count("teams", teams)?;
    require_non_negative("failure_rate", failure_rate)?;
    if !(repair_rate.is_finite() && repair_rate > 0.0) {
        return Err(SimError::undefined(
            "birth-death",
            format!("death rates vanish: μ={repair_rate}"),
        ));
    }

    let n = machines as usize;
    let mut pi = vec![0.0; n + 1];
    pi[0] = 1.0;
    for i in 1..=n {
        let birth = birth_rate(machines, failure_rate, (i - 1) as u32);
        let death = death_rate(repair_rate, teams, i as u32);
        pi[i] = pi[i - 1] * birth / death;
    }

    let total: f64 = pi.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(SimError::undefined(
            "birth-death",
            format!("normalising constant is {total}"),
        ));
    }
    for p in &mut pi {
        *p /= total;
    }

    let availability = pi
        .iter()
        .enumerate()
        .map(|(i, p)| (n - i) as f64 * p)
        .sum::<f64>()
        / n as f64;
    let mean_failed: f64 = pi.iter().enumerate().map(|(i, p)| i as f64 * p).sum();
    let utilization = mean_failed * failure_rate / (teams as f64 * repair_rate);

    Ok(PopulationTheory { pi, availability, mean_failed, utilization })
}

/// Generator matrix Q of the repair chain, (N+1)×(N+1).
/// Off-diagonals are the transition rates; each row sums to zero.
pub fn generator_matrix(
    machines: u32,
    failure_rate: f64,
    repair_rate: f64,
    teams: u32,
) -> Vec<Vec<f64>> {
    let n = machines as usize;
    let mut q = vec![vec![0.0; n + 1]; n + 1];
    for i in 0..=n {
        if i < n {
            q[i][i + 1] = birth_rate(machines, failure_rate, i as u32);
        }
        if i > 0 {
            q[i][i - 1] = death_rate(repair_rate, teams, i as u32);
        }
        let out: f64 = q[i].iter().sum();
        q[i][i] = -out;
    }
    q
}

pub(crate) fn birth_rate(machines: u32, failure_rate: f64, failed: u32) -> f64 {
    machines.saturating_sub(failed) as f64 * failure_rate
}

pub(crate) fn death_rate(repair_rate: f64, teams: u32, failed: u32) -> f64 {
    failed.min(teams) as f64 * repair_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn mm1_textbook_values() {
        let t = mm1(0.5, 1.0).unwrap();
        assert!(close(t.utilization, 0.5, 1e-12));
        assert!(close(t.w, 2.0, 1e-12));
        assert!(close(t.wq, 1.0, 1e-12));
        assert!(close(t.lq, 0.5, 1e-12));
        assert!(close(t.l, 1.0, 1e-12));
    }

    #[test]
    fn mm1_unstable_is_undefined() {
        let err = mm1(1.5, 1.0).unwrap_err();
        assert!(matches!(err, SimError::UndefinedTheoreticalResult { .. }));
        assert!(mm1(1.0, 1.0).is_err(), "λ = μ is not stable");
    }

    #[test]
    fn erlang_c_two_servers_reference() {
        // c=2, λ=1, μ=1.5: ρ=1/3, p0=1/2, Lq = 2ρ³/(1−ρ²) = 1/12.
        let t = mmc(1.0, 1.5, 2).unwrap();
        assert!(close(t.utilization, 1.0 / 3.0, 1e-12));
        assert!(close(t.p0, 0.5, 1e-9));
        assert!(close(t.lq, 1.0 / 12.0, 1e-6), "Lq={}", t.lq);
        assert!(close(t.wq, 1.0 / 12.0, 1e-6));
        assert!(close(t.w, 1.0 / 12.0 + 1.0 / 1.5, 1e-6));
    }

    #[test]
    fn erlang_c_with_one_server_matches_mm1() {
        let a = mmc(0.7, 1.1, 1).unwrap();
        let b = mm1(0.7, 1.1).unwrap();
        assert!(close(a.lq, b.lq, 1e-12));
        assert!(close(a.wq, b.wq, 1e-12));
        assert!(close(a.w, b.w, 1e-12));
    }

    #[test]
    fn mmc_unstable_and_idle_cases() {
        assert!(matches!(
            mmc(3.0, 1.0, 3),
            Err(SimError::UndefinedTheoreticalResult { .. })
        ));
        let idle = mmc(0.0, 1.0, 3).unwrap();
        assert_eq!(idle.lq, 0.0);
        assert_eq!(idle.wq, 0.0);
        assert!(close(idle.w, 1.0, 1e-12));
    }

    #[test]
    fn erlang_c_stays_finite_with_hundreds_of_servers() {
        // a^c and c! both overflow f64 for c = 200.
        let t = mmc(100.0, 1.0, 200).unwrap();
        for v in [t.p0, t.lq, t.l, t.wq, t.w] {
            assert!(v.is_finite(), "non-finite M/M/200 result: {t:?}");
        }
        assert!(close(t.utilization, 0.5, 1e-12));
        assert!(t.p0 > 0.0 && t.p0 < 1.0);
        assert!(t.wq >= 0.0 && t.lq >= 0.0);
        assert!(close(t.w, 1.0, 1e-6), "half-loaded M/M/200 barely queues: W={}", t.w);
        assert!(close(t.l, t.lq + 100.0, 1e-9));
    }

    #[test]
    fn erlang_c_heavy_load_with_many_servers() {
        let t = mmc(950.0, 1.0, 1_000).unwrap();
        assert!(t.lq.is_finite() && t.lq > 0.0, "Lq={}", t.lq);
        assert!(close(t.wq, t.lq / 950.0, 1e-12));
    }

    #[test]
    fn birth_death_single_team_recursion() {
        // N=3, λ=0.2, μ=0.5, one team: ratios 1.2, 0.8, 0.4.
        let t = birth_death_steady_state(3, 0.2, 0.5, 1).unwrap();
        let z = 1.0 + 1.2 + 0.96 + 0.384;
        let expected = [1.0 / z, 1.2 / z, 0.96 / z, 0.384 / z];
        for (p, e) in t.pi.iter().zip(expected) {
            assert!(close(*p, e, 1e-12), "π={p} expected {e}");
        }
        let mean: f64 = expected.iter().enumerate().map(|(i, p)| i as f64 * p).sum();
        assert!(close(t.mean_failed, mean, 1e-12));
        assert!(close(t.utilization, mean * 0.2 / 0.5, 1e-12));
        assert!(close(t.availability, (3.0 - mean) / 3.0, 1e-12));
    }

    #[test]
    fn birth_death_two_teams_uses_min_k_teams() {
        let t = birth_death_steady_state(3, 0.2, 0.5, 2).unwrap();
        // π1/π0 = 3·0.2/0.5, π2/π1 = 2·0.2/(2·0.5), π3/π2 = 0.2/(2·0.5)
        let z = 1.0 + 1.2 + 0.48 + 0.096;
        assert!(close(t.pi[3], 0.096 / z, 1e-12));
    }

    #[test]
    fn birth_death_normalises_for_many_parameter_sets() {
        for n in [1, 2, 3, 7, 20] {
            for teams in [1, 2, 5] {
                for (l, m) in [(0.05, 1.0), (0.2, 0.5), (1.0, 0.1), (3.0, 3.0)] {
                    let t = birth_death_steady_state(n, l, m, teams).unwrap();
                    assert_eq!(t.pi.len(), n as usize + 1);
                    let sum: f64 = t.pi.iter().sum();
                    assert!(close(sum, 1.0, 1e-12), "Σπ={sum} for N={n} teams={teams}");
                }
            }
        }
    }

    #[test]
    fn birth_death_without_failures_stays_up() {
        let t = birth_death_steady_state(3, 0.0, 0.5, 1).unwrap();
        assert_eq!(t.pi, vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(t.availability, 1.0);
    }

    #[test]
    fn generator_rows_sum_to_zero() {
        let q = generator_matrix(3, 0.2, 0.5, 2);
        assert_eq!(q.len(), 4);
        for row in &q {
            let s: f64 = row.iter().sum();
            assert!(close(s, 0.0, 1e-12));
        }
        assert!(close(q[0][1], 0.6, 1e-12));
        assert!(close(q[3][2], 1.0, 1e-12));
        assert!(close(q[1][1], -(0.4 + 0.5), 1e-12));
    }
}
