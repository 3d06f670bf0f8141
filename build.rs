use std::env;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_file = "proto/imagestore.proto";

    println!("cargo:rerun-if-changed={}", proto_file);
    println!("cargo:rerun-if-env-changed=IMAGESTORE_REGEN_PROTO");

    // The generated bindings are checked in under src/proto so that a plain
    // build does not need protoc. Set IMAGESTORE_REGEN_PROTO to refresh them.
    if env::var_os("IMAGESTORE_REGEN_PROTO").is_none() {
        return Ok(());
    }

    let proto_out_dir = Path::new("src/proto");
    if !proto_out_dir.exists() {
        std::fs::create_dir_all(proto_out_dir)?;
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .out_dir("src/proto")
        .compile(&[proto_file], &["proto"])?;

    Ok(())
}
