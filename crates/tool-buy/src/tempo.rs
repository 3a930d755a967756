use std::time::Duration;

use rand::Rng;

use crate::policy::PointerTempo;

/// Delay before the next synthetic pointer event.
pub fn step_delay(tempo: &PointerTempo) -> Duration {
    let jitter = if tempo.jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=tempo.jitter_ms)
    };
    Duration::from_millis(tempo.step_ms.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_within_bounds() {
        let tempo = PointerTempo {
            step_ms: 20,
            jitter_ms: 15,
        };
        for _ in 0..64 {
            let delay = step_delay(&tempo);
            assert!(delay >= Duration::from_millis(20));
            assert!(delay <= Duration::from_millis(35));
        }
    }

    #[test]
    fn zero_jitter_is_exact() {
        let tempo = PointerTempo {
            step_ms: 30,
            jitter_ms: 0,
        };
        assert_eq!(step_delay(&tempo), Duration::from_millis(30));
    }
}
