use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        return;
    };

    // Header consumed by the C++ Metamod bridge
    let output_path = manifest_dir.join("cpp/rust_exports.h");
    let config = cbindgen::Config::from_file(manifest_dir.join("cbindgen.toml")).unwrap_or_default();

    match cbindgen::Builder::new()
        .with_crate(&manifest_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            if let Some(parent) = output_path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            bindings.write_to_file(&output_path);
        }
        Err(e) => println!("cargo:warning=cbindgen failed, header not updated: {}", e),
    }
}
