/*!
 * midealan command-line tool.
 *
 * Exercises the codecs offline: decode a status body, build query and set
 * bodies, and list the supported device layouts.
 */
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use midealan_core::config::{Config, ConfigBuilder, DeviceEntry, SharedConfig};
use midealan_core::logging;
use midealan_core::types::Value;
use midealan_devices::message::{from_hex, parse_u8, to_hex, MessageType, Response};
use midealan_devices::{registry, DeviceAdapter};

const ENV_PREFIX: &str = "MIDEALAN";

#[derive(Parser, Debug)]
#[command(name = "midealan", version, about = "Midea LAN codec tool")]
struct Cli {
    /// Configuration file with [logging] and [[devices]] sections
    #[arg(long, short, value_name = "FILE", global = true, env = "MIDEALAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, overrides the configured level
    #[arg(long, value_name = "FILTER", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a received body and print the changed attributes
    Decode {
        #[command(flatten)]
        device: DeviceArgs,

        /// Message type from the frame header (name or code)
        #[arg(long, short = 't', default_value = "notify1")]
        message_type: MessageType,

        /// Decrypted body as hex
        body: String,
    },
    /// Print the query bodies for a device
    Query {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Build the body that sets one attribute
    Set {
        #[command(flatten)]
        device: DeviceArgs,

        /// Status body (hex, notify1) describing the current state
        #[arg(long, value_name = "HEX")]
        state: Option<String>,

        /// Attribute name
        attribute: String,

        /// New value: true/false, integer, float or text
        value: String,
    },
    /// List the supported device layouts
    List,
}

#[derive(Args, Debug, Clone, Default)]
struct DeviceArgs {
    /// Use the configured device with this id
    #[arg(long, value_name = "ID", conflicts_with = "device_type")]
    device: Option<u64>,

    /// Device class code, e.g. 0xFA
    #[arg(long = "type", value_name = "CODE", value_parser = parse_code)]
    device_type: Option<u8>,

    /// Model string
    #[arg(long, default_value = "")]
    model: String,

    /// Appliance subtype
    #[arg(long, default_value_t = 0)]
    subtype: u16,

    /// Protocol version placed in the message
    #[arg(long, default_value_t = 0)]
    protocol_version: u8,

    /// JSON customisation string
    #[arg(long, default_value = "")]
    customize: String,
}

fn parse_code(s: &str) -> std::result::Result<u8, String> {
    parse_u8(s).ok_or_else(|| format!("invalid device class code: {}", s))
}

impl DeviceArgs {
    /// Resolve the device entry from the arguments or the configuration
    fn entry(&self, config: &Config) -> Result<DeviceEntry> {
        if let Some(id) = self.device {
            return config
                .devices
                .iter()
                .find(|entry| entry.device_id == id)
                .cloned()
                .ok_or_else(|| anyhow!("device {} is not configured", id));
        }

        let device_type = self
            .device_type
            .context("either --device or --type is required")?;
        let mut entry = DeviceEntry::new(0, device_type, self.model.clone())
            .with_subtype(self.subtype)
            .with_customize(self.customize.clone());
        entry.protocol_version = self.protocol_version;
        Ok(entry)
    }

    fn adapter(&self, config: &Config) -> Result<Box<dyn DeviceAdapter>> {
        let entry = self.entry(config)?;
        registry::create(&entry).ok_or_else(|| {
            anyhow!(
                "device type 0x{:02X} (model {:?}) is not supported",
                entry.device_type,
                entry.model
            )
        })
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SharedConfig> {
    let mut builder = ConfigBuilder::new().with_environment_prefix(ENV_PREFIX);
    if let Some(path) = path {
        if !path.exists() {
            bail!("configuration file {} does not exist", path.display());
        }
        builder = builder.with_config_file(path);
    }
    let config = builder.build().context("failed to load configuration")?;
    Ok(SharedConfig::new(config))
}

fn run(command: Command, config: &SharedConfig) -> Result<Vec<String>> {
    let config = config.get();
    match command {
        Command::Decode {
            device,
            message_type,
            body,
        } => {
            let mut adapter = device.adapter(config)?;
            let body = from_hex(&body)?;
            let delta = adapter.process_message(&Response::new(message_type, body));
            Ok(vec![serde_json::to_string(&delta)?])
        }
        Command::Query { device } => {
            let adapter = device.adapter(config)?;
            Ok(adapter
                .build_query()
                .iter()
                .map(|message| to_hex(&message.body()))
                .collect())
        }
        Command::Set {
            device,
            state,
            attribute,
            value,
        } => {
            let mut adapter = device.adapter(config)?;
            if let Some(state) = state {
                let body = from_hex(&state)?;
                let delta = adapter.process_message(&Response::new(MessageType::Notify1, body));
                debug!("Primed state: {}", serde_json::to_string(&delta)?);
            }
            let value = Value::parse_literal(&value);
            Ok(match adapter.set_attribute(&attribute, value) {
                Some(message) => vec![to_hex(&message.body())],
                None => vec!["no message".to_string()],
            })
        }
        Command::List => Ok(registry::supported_keys()
            .into_iter()
            .map(str::to_string)
            .collect()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    match &cli.log_level {
        Some(filter) => logging::init_with_filter(filter)?,
        None => logging::init_from_config(&config.get().logging)?,
    }
    midealan_devices::init()?;

    for line in run(cli.command, &config)? {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn run_args(args: &[&str]) -> Result<Vec<String>> {
        let cli = Cli::try_parse_from(args.iter().copied())?;
        run(cli.command, &SharedConfig::new(Config::default()))
    }

    #[test]
    fn test_parses_decode() {
        let cli = Cli::try_parse_from([
            "midealan", "decode", "--type", "0xCC", "-t", "query", "01:84",
        ])
        .unwrap();
        match cli.command {
            Command::Decode {
                device,
                message_type,
                body,
            } => {
                assert_eq!(device.device_type, Some(0xCC));
                assert_eq!(message_type, MessageType::Query);
                assert_eq!(body, "01:84");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_device_and_type_together() {
        let err = Cli::try_parse_from(["midealan", "query", "--device", "1", "--type", "0xFA"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_decode_climate() {
        let mut body = vec!["00"; 24];
        body[0] = "01";
        body[1] = "84";
        body[2] = "80";
        body[3] = "1a";
        body[19] = "05";
        let body = body.join(":");
        let out = run_args(&["midealan", "decode", "--type", "0xCC", body.as_str()]).unwrap();
        let delta: serde_json::Value = serde_json::from_str(&out[0]).unwrap();
        assert_eq!(delta["power"], true);
        assert_eq!(delta["mode"], 3);
        assert_eq!(delta["target_temperature"], 26.5);
        assert_eq!(delta["fan_speed"], 0x80);
    }

    #[test]
    fn test_query_and_set_fan() {
        let out = run_args(&["midealan", "query", "--type", "250"]).unwrap();
        assert_eq!(out, vec![String::new()]);

        let out = run_args(&[
            "midealan", "set", "--type", "0xFA", "--subtype", "5", "fan_speed", "10",
        ])
        .unwrap();
        assert!(out[0].starts_with("00:00:00:00:01:0a:"));
    }

    #[test]
    fn test_set_primed_state_is_idempotent() {
        let out = run_args(&[
            "midealan",
            "set",
            "--type",
            "0xFA",
            "--state",
            "00:00:00:00:01:05:00:00:00",
            "power",
            "true",
        ])
        .unwrap();
        assert_eq!(out, vec!["no message".to_string()]);
    }

    #[test]
    fn test_unsupported_device() {
        let err = run_args(&["midealan", "query", "--type", "0xAC"]).unwrap_err();
        assert!(err.to_string().contains("not supported"));
        assert!(run_args(&["midealan", "query"]).is_err());
    }

    #[test]
    fn test_list() {
        let out = run_args(&["midealan", "list"]).unwrap();
        assert_eq!(out, vec!["cc", "fa", "fa_560000AG"]);
    }

    #[test]
    fn test_configured_device() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[[devices]]
device_id = 77
name = "Bedroom fan"
device_type = 250
model = "560000AG"
subtype = 5
"#
        )
        .unwrap();

        let config = load_config(Some(&file.path().to_path_buf())).unwrap();
        let cli =
            Cli::try_parse_from(["midealan", "set", "--device", "77", "mode", "ION"]).unwrap();
        let out = run(cli.command, &config).unwrap();
        assert!(out[0].starts_with("00:00:00:00:1d:"));

        let cli = Cli::try_parse_from(["midealan", "query", "--device", "78"]).unwrap();
        assert!(run(cli.command, &config).is_err());
        assert!(load_config(Some(&PathBuf::from("/nonexistent/midealan.toml"))).is_err());
    }
}
