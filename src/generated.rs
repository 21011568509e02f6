// Committed output of `SCALESIM_GEN_PROTOS=1 cargo build`; see build.rs.

pub mod scalesim {
    pub mod plugin {
        #[allow(clippy::all)]
        pub mod v1 {
            include!("proto_gen/scalesim.plugin.v1.rs");
        }
    }
}
