//! End-to-end driver tests over a scripted mock transport.
//!
//! Every test selects a real profile from the registry, scripts the
//! device's replies, and asserts both the decoded results and the exact
//! wire traffic (endpoints and frame bytes).

use std::time::Duration;

use ocean_spectro::calibration::info_address;
use ocean_spectro::profile;
use ocean_spectro::protocol::{RejectReason, SPECTRUM_TRAILER};
use ocean_spectro::{Acquisition, MockTransport, SpectroError, Spectrometer, TransportError};

/// USB2000+: commands on EP1 OUT, data on EP1 IN, spectra on EP2 IN.
fn usb2000_plus() -> Spectrometer<MockTransport> {
    let profile = profile::lookup(0x101E).unwrap();
    Spectrometer::new(MockTransport::new(), profile)
}

fn info_reply(address: u8, payload: &[u8]) -> Vec<u8> {
    let mut reply = vec![0x05, address];
    reply.extend_from_slice(payload);
    reply.push(0x00);
    reply
}

fn status_reply() -> Vec<u8> {
    vec![
        0x00, 0x08, // 2048 pixels
        0xA0, 0x86, 0x01, 0x00, // 100_000 us
        0x00, 0x00, 0x00, 0x09, 0x00, 0x00, // flag bytes
        0x00, 0x00, // reserved
        0x80, // usb speed
        0x00,
    ]
}

fn spectrum_packet(size: usize) -> Vec<u8> {
    let mut packet = vec![0u8; size];
    for (i, pair) in packet[..4096].chunks_exact_mut(2).enumerate() {
        pair.copy_from_slice(&(i as u16).to_le_bytes());
    }
    *packet.last_mut().unwrap() = SPECTRUM_TRAILER;
    packet
}

#[test]
fn test_init_and_register_write_frames() {
    let mut dev = usb2000_plus();
    dev.init().unwrap();
    dev.write_register(0x2B, 0x0102).unwrap();
    dev.set_integration_time(Duration::from_micros(1_000_000))
        .unwrap();

    let sent = dev.transport().sent();
    assert_eq!(
        sent,
        &[
            (0x01, vec![0x01]),
            (0x01, vec![0x6A, 0x2B, 0x02, 0x01]),
            (0x01, vec![0x02, 0x40, 0x42, 0x0F, 0x00]),
        ]
    );
}

#[test]
fn test_integration_time_must_fit_in_32_bits() {
    let mut dev = usb2000_plus();
    let err = dev
        .set_integration_time(Duration::from_secs(5_000))
        .unwrap_err();
    assert!(matches!(err, SpectroError::IntegrationTimeOutOfRange(_)));
    // Nothing reached the wire.
    assert!(dev.transport().sent().is_empty());
}

#[test]
fn test_query_status_round_trip() {
    let mut dev = usb2000_plus();
    dev.transport_mut().push_reply(status_reply());

    let status = dev.query_status().unwrap();
    assert_eq!(status.pixel_count, 2048);
    assert_eq!(status.integration_time_us, 100_000);
    assert_eq!(status.packets_in_spectrum, 9);
    assert_eq!(status.usb_speed, 0x80);

    assert_eq!(dev.transport().sent(), &[(0x01, vec![0xFE])]);
    assert_eq!(dev.transport().reads(), &[(0x81, 17)]);
}

#[test]
fn test_query_status_short_reply_is_malformed() {
    let mut dev = usb2000_plus();
    dev.transport_mut().push_reply(vec![0x00, 0x08, 0xA0]);
    assert!(matches!(
        dev.query_status().unwrap_err(),
        SpectroError::Malformed(_)
    ));
}

#[test]
fn test_query_information_round_trip() {
    let mut dev = usb2000_plus();
    dev.transport_mut().push_reply(info_reply(0, b"USB2G1234"));

    let serial = dev.query_information(0).unwrap();
    assert_eq!(serial, b"USB2G1234");
    assert_eq!(dev.transport().sent(), &[(0x01, vec![0x05, 0x00])]);
    assert_eq!(dev.transport().reads(), &[(0x81, 17)]);
}

#[test]
fn test_query_information_echo_mismatch() {
    let mut dev = usb2000_plus();
    // Device echoes address 3 when 5 was asked.
    dev.transport_mut().push_reply(info_reply(3, b"1.0"));

    let err = dev.query_information(5).unwrap_err();
    assert!(matches!(
        err,
        SpectroError::ProtocolMismatch {
            address: 5,
            got_opcode: 0x05,
            got_echo: 3,
        }
    ));
}

#[test]
fn test_transport_failure_propagates_unchanged() {
    let mut dev = usb2000_plus();
    dev.transport_mut()
        .inject_failure(TransportError::Disconnected);

    let err = dev.query_status().unwrap_err();
    assert!(matches!(
        err,
        SpectroError::Transport(TransportError::Disconnected)
    ));
}

#[test]
fn test_request_spectrum_decodes_valid_packet() {
    let mut dev = usb2000_plus();
    let size = dev.profile().spectrum_packet_size;
    dev.transport_mut().push_reply(spectrum_packet(size));

    let Acquisition::Spectrum(pixels) = dev.request_spectrum().unwrap() else {
        panic!("expected a decoded spectrum");
    };
    assert_eq!(pixels.len(), 2048);
    assert_eq!(pixels[1], pixels[0]);
    assert_eq!(pixels[100], 100);

    // Request frame on the command endpoint, packet read on the spectrum
    // endpoint at the profile's exact packet size.
    assert_eq!(dev.transport().sent(), &[(0x01, vec![0x09])]);
    assert_eq!(dev.transport().reads(), &[(0x82, size)]);
}

#[test]
fn test_request_spectrum_rejects_then_recovers() {
    let mut dev = usb2000_plus();
    let size = dev.profile().spectrum_packet_size;

    let mut bad_trailer = spectrum_packet(size);
    *bad_trailer.last_mut().unwrap() = 0x00;
    dev.transport_mut().push_reply(bad_trailer);
    dev.transport_mut().push_reply(vec![0u8; 100]); // truncated packet
    dev.transport_mut().push_reply(spectrum_packet(size));

    assert_eq!(
        dev.request_spectrum().unwrap(),
        Acquisition::Rejected(RejectReason::BadTrailer { byte: 0x00 })
    );
    assert_eq!(
        dev.request_spectrum().unwrap(),
        Acquisition::Rejected(RejectReason::LengthMismatch {
            got: 100,
            expected: size,
        })
    );
    // A rejected packet is a soft failure; the next request simply works.
    assert!(matches!(
        dev.request_spectrum().unwrap(),
        Acquisition::Spectrum(_)
    ));
}

#[test]
fn test_usb2000_uses_its_own_endpoints() {
    // USB2000 commands go to EP2 OUT and data comes back on EP7 IN.
    let profile = profile::lookup(0x1002).unwrap();
    let mut dev = Spectrometer::new(MockTransport::new(), profile);
    dev.transport_mut().push_reply(status_reply());

    dev.query_status().unwrap();
    assert_eq!(dev.transport().sent(), &[(0x02, vec![0xFE])]);
    assert_eq!(dev.transport().reads(), &[(0x87, 17)]);
}

#[test]
fn test_read_calibration_issues_the_documented_sequence() {
    let mut dev = usb2000_plus();
    {
        let mock = dev.transport_mut();
        mock.push_reply(info_reply(0, b"USB2G1234"));
        for (i, coeff) in [b"178.287" as &[u8], b"0.3803", b"-1.4e-05", b"-2.2e-09"]
            .iter()
            .enumerate()
        {
            mock.push_reply(info_reply(1 + i as u8, coeff));
        }
        mock.push_reply(info_reply(5, b"3.0"));
        for i in 0..8u8 {
            mock.push_reply(info_reply(6 + i, b"0.91"));
        }
        mock.push_reply(info_reply(14, b"7"));
        mock.push_reply(info_reply(15, b"HC1 500 25"));
        mock.push_reply(info_reply(16, b"S 2 Y 3"));
    }

    let calibration = dev.read_calibration().unwrap();
    assert_eq!(calibration.serial_number.as_text().unwrap(), "USB2G1234");
    assert!((calibration.wavelength_coefficients[0].as_f64().unwrap() - 178.287).abs() < 1e-9);
    assert!((calibration.stray_light_constant.as_f64().unwrap() - 3.0).abs() < 1e-9);
    assert_eq!(calibration.nonlinearity_coefficients.len(), 8);
    assert_eq!(calibration.polynomial_order.as_text().unwrap(), "7");
    assert_eq!(
        calibration.grating_filter_slit.as_text().unwrap(),
        "HC1 500 25"
    );

    // Seventeen queries, addresses 0 through 16, in the documented order.
    let sent = dev.transport().sent();
    assert_eq!(sent.len(), 17);
    for (i, (endpoint, frame)) in sent.iter().enumerate() {
        assert_eq!(*endpoint, 0x01);
        assert_eq!(frame, &vec![0x05, i as u8]);
    }
    assert_eq!(sent[0].1[1], info_address::SERIAL_NUMBER);
    assert_eq!(sent[16].1[1], info_address::DETECTOR_INFO);
}

#[test]
fn test_calibration_is_not_cached() {
    let mut dev = usb2000_plus();
    for _ in 0..2 {
        let mock = dev.transport_mut();
        for address in 0..=16u8 {
            mock.push_reply(info_reply(address, b"1"));
        }
    }

    dev.read_calibration().unwrap();
    dev.read_calibration().unwrap();
    // Every field was re-queried the second time.
    assert_eq!(dev.transport().sent().len(), 34);
}
