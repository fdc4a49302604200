fn main() {
    if let Err(err) = tabform::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
