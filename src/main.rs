fn main() {
    if let Err(err) = trip_loader::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
