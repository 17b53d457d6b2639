use dripline::Store;
use tracing_subscriber::EnvFilter;

// RUST_LOG=dripline=trace cargo run --example basic
fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let mut store = Store::new(3, 1.0).unwrap();
    // a burst of five at t=0, then one request every half second
    let timestamps = [0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.5, 2.0];
    for ts in timestamps {
        let (decision, next) = store.evaluate("alice", ts).unwrap();
        store = next;
        let bucket = store.lookup("alice").unwrap();
        println!("t={ts:.1} {decision:?} {bucket}");
    }
    println!("{store:?}");
}
