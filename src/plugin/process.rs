use std::ffi::OsStr;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};

use tokio::runtime::Runtime;
use tonic::transport::Channel;
use tracing::{debug, info};

use crate::{
    error::{PluginError, SimResult, TransportError},
    generated::scalesim::plugin::v1 as proto,
    generated::scalesim::plugin::v1::autoscaler_plugin_client::AutoscalerPluginClient,
    plugin::bridge::{
        ObjectEvent, Partition, Plugin, PluginCapability, PluginObject, PluginStat,
        ResourceRecommendation,
    },
};

/// Handshake protocol version this host speaks.
const CORE_PROTOCOL_VERSION: u32 = 1;

/// An out-of-process autoscaler policy.
///
/// The policy binary is spawned with stdout piped; it announces its RPC
/// endpoint with a single handshake line
///
/// ```text
/// CORE-VERSION|APP-VERSION|network|address|protocol
/// ```
///
/// after which all traffic is gRPC on that endpoint. Calls are synchronous
/// from the simulator's perspective; the blocking happens on an owned
/// single-purpose runtime, so the environment must not itself run inside an
/// async context.
pub struct PluginProcess {
    child: Child,
    client: AutoscalerPluginClient<Channel>,
    runtime: Runtime,
}

impl PluginProcess {
    /// Spawns the plugin binary, reads the handshake line and connects.
    pub fn launch(program: impl AsRef<OsStr>, args: &[&str]) -> SimResult<Self> {
        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(PluginError::Launch)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PluginError::Handshake("plugin stdout not captured".to_string()))?;
        let mut line = String::new();
        BufReader::new(stdout)
            .read_line(&mut line)
            .map_err(PluginError::Launch)?;
        let address = parse_handshake(line.trim())?;
        info!(%address, "plugin handshake complete");

        let runtime = Runtime::new().map_err(PluginError::Launch)?;
        let endpoint = format!("http://{address}");
        let client = runtime
            .block_on(AutoscalerPluginClient::connect(endpoint))
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self {
            child,
            client,
            runtime,
        })
    }
}

fn parse_handshake(line: &str) -> Result<String, PluginError> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 5 {
        return Err(PluginError::Handshake(format!(
            "expected CORE|APP|network|address|protocol, got '{line}'"
        )));
    }
    let core: u32 = parts[0]
        .parse()
        .map_err(|_| PluginError::Handshake(format!("bad core version '{}'", parts[0])))?;
    if core != CORE_PROTOCOL_VERSION {
        return Err(PluginError::Handshake(format!(
            "unsupported core protocol version {core}"
        )));
    }
    if parts[2] != "tcp" {
        return Err(PluginError::Handshake(format!(
            "unsupported network '{}'",
            parts[2]
        )));
    }
    if parts[4] != "grpc" {
        return Err(PluginError::Handshake(format!(
            "unsupported protocol '{}'",
            parts[4]
        )));
    }
    Ok(parts[3].to_string())
}

fn rpc_error(status: tonic::Status) -> PluginError {
    PluginError::Rpc(format!("{}: {}", status.code(), status.message()))
}

impl Plugin for PluginProcess {
    fn event(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
        event: ObjectEvent,
        object: &PluginObject,
    ) -> Result<(), PluginError> {
        debug!(%partition, %event, "plugin event");
        let request = proto::EventRequest {
            partition: partition.to_string(),
            time: at_nanos,
            r#type: proto::EventType::from(event) as i32,
            object: Some(object.into()),
        };
        self.runtime
            .block_on(self.client.event(request))
            .map_err(rpc_error)?;
        Ok(())
    }

    fn stat(&mut self, partition: &Partition, stats: &[PluginStat]) -> Result<(), PluginError> {
        let request = proto::StatRequest {
            partition: partition.to_string(),
            stats: stats.iter().map(proto::Stat::from).collect(),
        };
        self.runtime
            .block_on(self.client.stat(request))
            .map_err(rpc_error)?;
        Ok(())
    }

    fn horizontal_recommendation(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
    ) -> Result<i32, PluginError> {
        let request = proto::HorizontalRecommendationRequest {
            partition: partition.to_string(),
            time: at_nanos,
        };
        let response = self
            .runtime
            .block_on(self.client.horizontal_recommendation(request))
            .map_err(rpc_error)?;
        let replicas = response.into_inner().replicas;
        if replicas < 0 {
            return Err(PluginError::MalformedResponse(format!(
                "negative replica recommendation: {replicas}"
            )));
        }
        Ok(replicas)
    }

    fn vertical_recommendation(
        &mut self,
        partition: &Partition,
        at_nanos: i64,
    ) -> Result<Vec<ResourceRecommendation>, PluginError> {
        let request = proto::VerticalRecommendationRequest {
            partition: partition.to_string(),
            time: at_nanos,
        };
        let response = self
            .runtime
            .block_on(self.client.vertical_recommendation(request))
            .map_err(rpc_error)?;
        Ok(response
            .into_inner()
            .recommendations
            .into_iter()
            .map(ResourceRecommendation::from)
            .collect())
    }

    fn capabilities(&mut self) -> Result<Vec<PluginCapability>, PluginError> {
        let response = self
            .runtime
            .block_on(self.client.get_capabilities(proto::GetCapabilitiesRequest {}))
            .map_err(rpc_error)?;
        response
            .into_inner()
            .capabilities
            .into_iter()
            .map(|raw| {
                proto::Capability::try_from(raw)
                    .map_err(|_| {
                        PluginError::MalformedResponse(format!("unknown capability {raw}"))
                    })
                    .and_then(PluginCapability::try_from)
            })
            .collect()
    }

    fn plugin_type(&mut self) -> Result<String, PluginError> {
        let response = self
            .runtime
            .block_on(self.client.plugin_type(proto::PluginTypeRequest {}))
            .map_err(rpc_error)?;
        Ok(response.into_inner().r#type)
    }
}

impl Drop for PluginProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
