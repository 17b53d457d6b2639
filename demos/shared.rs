use std::time::Duration;

use dripline::{Limiter, QuantaClock, Store};
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let store = Store::with_ttl(20, 10.0, Duration::from_secs(5))
        .unwrap()
        .with_max_entries(1_000)
        .unwrap();
    let limiter = Limiter::with_clock(store, QuantaClock::default());

    std::thread::scope(|s| {
        for worker in 0..4 {
            let limiter = &limiter;
            s.spawn(move || {
                let mut admitted = 0;
                for i in 0..200 {
                    let key = format!("client-{}", i % 8);
                    if limiter.check(&key).unwrap().is_admitted() {
                        admitted += 1;
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
                println!("[worker={worker}] admitted {admitted}/200");
            });
        }
    });

    limiter.evict();
    println!("{limiter:?}");
}
