use std::sync::Mutex;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const EPOCH: u64 = 1_725_513_600_000u64;
const COUNTER_BITS: u64 = 12;
const PID_BITS: u64 = 5;
const SID_BITS: u64 = 5;

#[derive(Debug)]
struct GeneratorState {
    last_ts: u64,
    counter: u64,
}

/// Time-ordered 64-bit ID generator. IDs generated later always compare
/// greater, which is what cursor pagination relies on for its tie-break.
#[derive(Debug)]
pub struct SnowflakeGenerator {
    state: Mutex<GeneratorState>,
    server_id: u8,
    worker_id: u64,
}

impl SnowflakeGenerator {
    pub fn new(server_id: u8, worker_id: u64) -> Self {
        let max_pid = (1u64 << PID_BITS) - 1;
        let max_sid = (1u64 << SID_BITS) - 1;
        assert!(
            worker_id <= max_pid,
            "worker_id {} exceeds max {}",
            worker_id,
            max_pid
        );
        assert!(
            (server_id as u64) <= max_sid,
            "server_id {} exceeds max {}",
            server_id,
            max_sid
        );

        Self {
            state: Mutex::new(GeneratorState {
                last_ts: 0,
                counter: 0,
            }),
            server_id,
            worker_id,
        }
    }

    fn current_time_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_millis() as u64
    }

    pub fn generate(&self) -> u64 {
        let seq_mask = (1u64 << COUNTER_BITS) - 1;
        let out_ts: u64;
        let out_counter: u64;

        // Loop until a valid (ts, counter) pair is available; drops the lock
        // and sleeps a millisecond when the sequence for this ms is exhausted
        // or the clock moved backwards.
        loop {
            let mut st = self.state.lock().unwrap();
            let now = Self::current_time_ms().saturating_sub(EPOCH);

            if now < st.last_ts {
                drop(st);
                thread::sleep(Duration::from_millis(1));
                continue;
            }

            if now == st.last_ts {
                if st.counter < seq_mask {
                    st.counter += 1;
                    out_ts = st.last_ts;
                    out_counter = st.counter;
                    break;
                }
                drop(st);
                thread::sleep(Duration::from_millis(1));
                continue;
            }

            st.last_ts = now;
            st.counter = 0;
            out_ts = st.last_ts;
            out_counter = st.counter;
            break;
        }

        (out_ts << (COUNTER_BITS + SID_BITS + PID_BITS))
            | ((self.worker_id & ((1 << PID_BITS) - 1)) << (COUNTER_BITS + SID_BITS))
            | (((self.server_id as u64) & ((1 << SID_BITS) - 1)) << COUNTER_BITS)
            | (out_counter & ((1 << COUNTER_BITS) - 1))
    }

    /// Recover (creation epoch seconds, server_id, worker_id, counter) from an ID.
    pub fn parse(id: u64) -> (f64, u8, u8, u16) {
        let ts = (id >> (COUNTER_BITS + SID_BITS + PID_BITS)) + EPOCH;
        let pid = ((id >> (COUNTER_BITS + SID_BITS)) & ((1 << PID_BITS) - 1)) as u8;
        let sid = ((id >> COUNTER_BITS) & ((1 << SID_BITS) - 1)) as u8;
        let counter = (id & ((1 << COUNTER_BITS) - 1)) as u16;
        (ts as f64 / 1000.0, sid, pid, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let generator = SnowflakeGenerator::new(0, 0);
        let mut last = 0u64;
        for _ in 0..5000 {
            let id = generator.generate();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn parse_recovers_components() {
        let generator = SnowflakeGenerator::new(3, 7);
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        let id = generator.generate();
        let (ts, sid, pid, _) = SnowflakeGenerator::parse(id);
        assert_eq!(sid, 3);
        assert_eq!(pid, 7);
        assert!((ts - before).abs() < 5.0);
    }

    #[test]
    fn fits_in_signed_64_bits() {
        let generator = SnowflakeGenerator::new(31, 31);
        let id = generator.generate();
        assert!(i64::try_from(id).is_ok());
    }
}
