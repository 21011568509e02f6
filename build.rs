fn main() -> Result<(), Box<dyn std::error::Error>> {
    // MAINTAINER NOTE:
    // This build script is disabled by default so the crate builds without
    // `protoc` installed.
    //
    // The generated Rust code is committed to `src/proto_gen`.
    //
    // To regenerate the protobuf bindings (after updating proto/), run:
    //     SCALESIM_GEN_PROTOS=1 cargo build
    //
    // Then commit the changes in `src/proto_gen`.
    if std::env::var("SCALESIM_GEN_PROTOS").is_err() {
        return Ok(());
    }

    let proto_root_path = std::fs::canonicalize("proto")?;
    let proto_root = proto_root_path.to_str().ok_or("Invalid path")?.to_string();

    let proto_files = [format!("{proto_root}/scalesim/plugin/v1/plugin.proto")];

    for proto_file in &proto_files {
        println!("cargo:rerun-if-changed={}", proto_file);
    }

    tonic_prost_build::configure()
        .build_client(true)
        .build_server(false)
        .out_dir("src/proto_gen")
        .compile_protos(&proto_files, &[proto_root])?;

    std::process::Command::new("cargo")
        .args(["fmt", "--", "src/proto_gen/*.rs"])
        .status()
        .ok();

    Ok(())
}
