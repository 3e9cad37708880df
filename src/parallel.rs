use std::env;

const DEFAULT_THREADS: usize = 6;
const MAX_THREADS: usize = 32;

/// Run `action` on a rayon pool sized by the env var `var` (default 6, clamped to
/// `floor..=32`). Falls back to the caller's thread if the pool cannot be built.
pub fn with_env_pool<T>(var: &str, floor: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    let threads = parallelism(env::var(var).ok().as_deref(), floor);
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}

fn parallelism(raw: Option<&str>, floor: usize) -> usize {
    raw.and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_THREADS)
        .clamp(floor, MAX_THREADS)
}
