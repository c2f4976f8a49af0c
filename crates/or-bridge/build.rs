fn main() {
    println!("cargo:rerun-if-changed=shim/retro_log.c");

    // The log interface handed to cores is printf-style variadic, which
    // stable Rust cannot define. A small C shim formats the line and calls
    // back into Rust.
    cc::Build::new()
        .file("shim/retro_log.c")
        .warnings(true)
        .compile("retro_log_shim");
}
