fn main() {
    if let Err(err) = shenzhen_solver::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
