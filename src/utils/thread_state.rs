use crate::utils::snowflake::SnowflakeGenerator;
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::{env, thread_local};

static THREAD_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct ThreadState {
    snowflake: SnowflakeGenerator,
}

thread_local! {
    static STATE: RefCell<Option<ThreadState>> = const { RefCell::new(None) };
}

fn thread_state<F, R>(f: F) -> R
where
    F: FnOnce(&mut ThreadState) -> R,
{
    STATE.with(|cell| {
        let mut opt = cell.borrow_mut();
        if opt.is_none() {
            let worker_id = THREAD_COUNTER.fetch_add(1, Ordering::Relaxed) as u64;
            let server_id = env::var("SERVER_ID")
                .unwrap_or("0".to_string())
                .parse()
                .expect("SERVER_ID wrong type");

            *opt = Some(ThreadState {
                snowflake: SnowflakeGenerator::new(server_id, worker_id % 32),
            });
        }

        f(opt.as_mut().unwrap())
    })
}

/// Generate a fresh snowflake ID from this worker thread's generator.
pub fn generate_id() -> i64 {
    thread_state(|st| st.snowflake.generate()) as i64
}
