extern crate protoc_grpcio;

fn main() {
    let protos = [
        ("protos", "p4/v1/p4runtime.proto"),
        ("protos", "p4/config/v1/p4info.proto"),
        ("protos", "gnmi/gnmi.proto"),
        ("protos", "google/rpc/status.proto"),
        ("protos", "google/rpc/code.proto"),
    ];
    for proto in &protos {
        println!("cargo:rerun-if-changed={}/{}", proto.0, proto.1);
    }
    protoc_grpcio::compile_grpc_protos(
        &protos.iter().map(|x| x.1).collect::<Vec<&str>>(),
        &protos.iter().map(|x| x.0).collect::<Vec<&str>>(),
        "src/",
        None,
    )
    .expect("Failed to compile gRPC definitions!");
}
