fn main() {
    if let Err(e) = ytube_client_lib::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
