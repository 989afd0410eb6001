/// Parallel processing utilities

pub fn configure_thread_pool(threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(effective_threads(threads))
        .build_global()
}

/// Resolve a thread setting where 0 means "all cores"
pub fn effective_threads(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get()
    } else {
        threads
    }
}

pub fn chunk_size_for_parallelism(total_items: usize, threads: usize) -> usize {
    let threads = if threads == 0 {
        rayon::current_num_threads()
    } else {
        threads
    };

    // At least 16 rows per task, at most 512
    let ideal_chunk = total_items / (threads * 8).max(1);
    ideal_chunk.clamp(16, 512)
}
