use uuid::Uuid;

use crate::domain::Metric;
use crate::error::DecodeError;

// 16-bit characteristic numbers expanded against the Bluetooth base UUID

/// Temperature characteristic (0x2A6E)
pub const TEMPERATURE_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x00002a6e_0000_1000_8000_00805f9b34fb);

/// Humidity characteristic (0x2A6F)
pub const HUMIDITY_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x00002a6f_0000_1000_8000_00805f9b34fb);

/// Soil moisture characteristic (0x2A70)
pub const SOIL_MOISTURE_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x00002a70_0000_1000_8000_00805f9b34fb);

/// Pressure characteristic (0x2A6D)
pub const PRESSURE_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x00002a6d_0000_1000_8000_00805f9b34fb);

/// Notification payloads carry a single little-endian f32
pub const SAMPLE_PAYLOAD_LEN: usize = 4;

/// Map a characteristic to the metric it reports
pub fn metric_for_characteristic(characteristic: Uuid) -> Option<Metric> {
    if characteristic == TEMPERATURE_CHARACTERISTIC {
        Some(Metric::Temperature)
    } else if characteristic == HUMIDITY_CHARACTERISTIC {
        Some(Metric::Humidity)
    } else if characteristic == SOIL_MOISTURE_CHARACTERISTIC {
        Some(Metric::SoilMoisture)
    } else if characteristic == PRESSURE_CHARACTERISTIC {
        Some(Metric::Pressure)
    } else {
        None
    }
}

/// Decode one sensor notification payload
/// Notifications from characteristics outside the sensor table yield Ok(None)
pub fn decode_sample(
    characteristic: Uuid,
    payload: &[u8],
) -> Result<Option<(Metric, f64)>, DecodeError> {
    let metric = match metric_for_characteristic(characteristic) {
        Some(metric) => metric,
        None => return Ok(None),
    };

    if payload.len() != SAMPLE_PAYLOAD_LEN {
        return Err(DecodeError::UnexpectedLength {
            expected: SAMPLE_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }

    let raw = f32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    if !raw.is_finite() {
        return Err(DecodeError::NonFinite);
    }

    Ok(Some((metric, round_to_tenth(raw as f64))))
}

/// Values are stored and displayed with one decimal place
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_for_characteristic() {
        assert_eq!(
            metric_for_characteristic(TEMPERATURE_CHARACTERISTIC),
            Some(Metric::Temperature)
        );
        assert_eq!(
            metric_for_characteristic(HUMIDITY_CHARACTERISTIC),
            Some(Metric::Humidity)
        );
        assert_eq!(
            metric_for_characteristic(SOIL_MOISTURE_CHARACTERISTIC),
            Some(Metric::SoilMoisture)
        );
        assert_eq!(
            metric_for_characteristic(PRESSURE_CHARACTERISTIC),
            Some(Metric::Pressure)
        );

        // Battery level (0x2A19) is not a sensor characteristic
        let battery = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);
        assert_eq!(metric_for_characteristic(battery), None);
    }

    #[test]
    fn test_characteristic_uuid_format() {
        assert_eq!(
            TEMPERATURE_CHARACTERISTIC.to_string(),
            "00002a6e-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            PRESSURE_CHARACTERISTIC.to_string(),
            "00002a6d-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_decode_sample() {
        let payload = 22.5_f32.to_le_bytes();
        let decoded = decode_sample(TEMPERATURE_CHARACTERISTIC, &payload).unwrap();
        assert_eq!(decoded, Some((Metric::Temperature, 22.5)));
    }

    #[test]
    fn test_decode_sample_rounds_to_one_decimal() {
        let payload = 45.6789_f32.to_le_bytes();
        let decoded = decode_sample(SOIL_MOISTURE_CHARACTERISTIC, &payload).unwrap();
        assert_eq!(decoded, Some((Metric::SoilMoisture, 45.7)));

        let payload = (-3.14159_f32).to_le_bytes();
        let decoded = decode_sample(TEMPERATURE_CHARACTERISTIC, &payload).unwrap();
        assert_eq!(decoded, Some((Metric::Temperature, -3.1)));
    }

    #[test]
    fn test_decode_sample_unknown_characteristic() {
        let battery = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);
        let payload = 99.0_f32.to_le_bytes();
        assert_eq!(decode_sample(battery, &payload), Ok(None));

        // Unknown characteristics are skipped before the length check
        assert_eq!(decode_sample(battery, &[1, 2]), Ok(None));
    }

    #[test]
    fn test_decode_sample_wrong_length() {
        assert_eq!(
            decode_sample(HUMIDITY_CHARACTERISTIC, &[]),
            Err(DecodeError::UnexpectedLength {
                expected: 4,
                actual: 0
            })
        );
        assert_eq!(
            decode_sample(HUMIDITY_CHARACTERISTIC, &[0x00, 0x00]),
            Err(DecodeError::UnexpectedLength {
                expected: 4,
                actual: 2
            })
        );
        assert_eq!(
            decode_sample(HUMIDITY_CHARACTERISTIC, &[0x00; 8]),
            Err(DecodeError::UnexpectedLength {
                expected: 4,
                actual: 8
            })
        );
    }

    #[test]
    fn test_decode_sample_non_finite() {
        let nan = f32::NAN.to_le_bytes();
        assert_eq!(
            decode_sample(PRESSURE_CHARACTERISTIC, &nan),
            Err(DecodeError::NonFinite)
        );

        let inf = f32::INFINITY.to_le_bytes();
        assert_eq!(
            decode_sample(PRESSURE_CHARACTERISTIC, &inf),
            Err(DecodeError::NonFinite)
        );

        let neg_inf = f32::NEG_INFINITY.to_le_bytes();
        assert_eq!(
            decode_sample(PRESSURE_CHARACTERISTIC, &neg_inf),
            Err(DecodeError::NonFinite)
        );
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(22.449), 22.4);
        assert_eq!(round_to_tenth(22.46), 22.5);
        assert_eq!(round_to_tenth(-0.04), -0.0);
        assert_eq!(round_to_tenth(1013.25), 1013.3);
    }
}
