use midealan_core::logging;
use midealan_devices::message::{from_hex, to_hex, MessageType, Response};
use midealan_devices::prelude::{info, DeviceEntry, Value};
use midealan_devices::registry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    logging::init_with_filter("debug")?;
    midealan_devices::init()?;

    // A 560000AG fan on the short set layout
    let entry = DeviceEntry::new(0x1234, 0xFA, "560000AG")
        .with_subtype(5)
        .with_customize(r#"{"speed_count": 4}"#);

    let mut fan = registry::create(&entry).ok_or("fan model is not supported")?;
    info!("Created adapter for {:?}", fan.info());

    // Ask for the current state
    for query in fan.build_query() {
        info!("Query: {}", query);
    }

    // The appliance reports: on, Sleep, speed 3, not oscillating
    let body = from_hex("00:00:00:00:07:03:00:00:00")?;
    let delta = fan.process_message(&Response::new(MessageType::Notify1, body));
    info!("Changed: {}", serde_json::to_string(&delta)?);

    // Switch to ION mode and start oscillating
    for (name, value) in [("mode", Value::from("ION")), ("oscillate", Value::Bool(true))] {
        match fan.set_attribute(name, value) {
            Some(message) => info!("Send {} -> {}", name, to_hex(&message.body())),
            None => info!("Nothing to send for {}", name),
        }
    }

    // Same value as the current state: nothing to send
    if fan.set_attribute("fan_speed", Value::Integer(3)).is_none() {
        info!("fan_speed already 3");
    }

    info!("State: {}", serde_json::to_string(&fan.attributes())?);

    Ok(())
}
