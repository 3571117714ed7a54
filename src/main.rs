fn main() {
    #[cfg(unix)]
    unsafe {
        // Avoid panics when piping output (e.g. `update-densities --list | head`).
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    if let Err(err) = update_densities::run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
