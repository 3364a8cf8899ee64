fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_path = if std::path::Path::new("/rust-build/proto").exists() {
        // Docker build path
        "/rust-build/proto/rule_installation.proto"
    } else {
        // Local development path: workspace_root/proto
        "../proto/rule_installation.proto"
    };

    let include_path = if std::path::Path::new("/rust-build/proto").exists() {
        "/rust-build/proto"
    } else {
        "../proto"
    };

    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(&[proto_path], &[include_path])?;
    Ok(())
}
