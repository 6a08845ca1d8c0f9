use uuid::Uuid;

/**
 * Advertised name of the radio's BLE remote interface.
 */
pub const DEFAULT_DEVICE_NAME: &str = "DexRadio_Remote";

/**
 * How often (milliseconds) to look at the discovered peripherals while searching for the radio.
 */
pub const SCAN_POLL_DELAY: u64 = 500;

/**
 * How long (milliseconds) a write to the command characteristic may take.
 */
pub const WRITE_DEADLINE: u64 = 2000;

/**
 * How long (milliseconds) to wait after ADD/DEL before asking the radio for the new station list.
 * The radio rewrites its station store before it can answer LIST again.
 */
pub const REFRESH_DELAY: u64 = 1000;

/**
 * Size (degrees) of one volume step on the rotary knob.
 */
pub const VOLUME_STEP_DEGREES: u16 = 30;

/**
 * The UUID of the Nordic UART style service exposed by the radio.
 */
pub const RADIO_SERVICE: &str = "6e400001-b5a3-f393-e0a9-e50e24dcca9e";

/**
 * The characteristic commands are written to.
 */
pub const RADIO_COMMAND_CHARACTERISTIC: &str = "6e400002-b5a3-f393-e0a9-e50e24dcca9e";

/**
 * The characteristic the radio sends status notifications on.
 */
pub const RADIO_NOTIFY_CHARACTERISTIC: &str = "6e400003-b5a3-f393-e0a9-e50e24dcca9e";

pub fn make_radio_service_uuid() -> Uuid {
    Uuid::parse_str(RADIO_SERVICE).unwrap()
}

pub fn make_radio_command_uuid() -> Uuid {
    Uuid::parse_str(RADIO_COMMAND_CHARACTERISTIC).unwrap()
}

pub fn make_radio_notify_uuid() -> Uuid {
    Uuid::parse_str(RADIO_NOTIFY_CHARACTERISTIC).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuids_share_base() {
        let service = make_radio_service_uuid().to_string();
        let command = make_radio_command_uuid().to_string();
        let notify = make_radio_notify_uuid().to_string();
        assert_eq!(&service[8..], &command[8..]);
        assert_eq!(&service[8..], &notify[8..]);
        assert!(command.starts_with("6e400002"));
        assert!(notify.starts_with("6e400003"));
    }
}
