//! End-to-end decoder tests: full 510-bit bursts through `rx_symbol` down
//! to LLC / U-plane deliveries.

mod common;

use common::*;

use tetra_core::{AddressKind, BitBuffer, LogicalChannel, MacAddress, TdmaTime};
use tetra_pdus::enums::downlink_usage::DownlinkUsage;
use tetra_pdus::pdus::mac_end::MacEnd;
use tetra_pdus::pdus::mac_resource::{self, MacResource};
use tetra_rx::coding::scrambler;

fn mac_resource_type1(length_ind: u8, ssi: u32, fill_bits: bool) -> BitBuffer {
    let mut buf = BitBuffer::new_autoexpand(268);
    let pdu = MacResource {
        fill_bits,
        pos_of_grant: 0,
        encryption_mode: 0,
        random_access_flag: false,
        length_ind,
        address: MacAddress::new(AddressKind::Ssi(ssi), 0),
        power_control_element: None,
        slot_granting_element: None,
        chan_alloc_element: None,
    };
    pdu.to_bitbuf(&mut buf);
    buf
}

fn sdu_pattern(len: usize) -> String {
    (0..len).map(|i| if (i * 5) % 3 == 0 { '1' } else { '0' }).collect()
}

fn write_bitstr(buf: &mut BitBuffer, bits: &str) {
    for c in bits.chars() {
        buf.write_bit(if c == '1' { 1 } else { 0 });
    }
}

/// S1: a synchronization burst updates time, cell identity and scrambling
/// code, and delivers the BSCH and SYSINFO SDUs.
#[test]
fn test_sb_burst_happy_path() {
    let mut h = make_decoder();

    let found = feed_burst(&mut h.decoder, &sync_burst());
    assert!(found);
    assert!(h.decoder.is_synchronized());

    // time comes from the SYNC content
    assert_eq!(h.decoder.mac().time(), TdmaTime { t: 3, f: 18, m: 5 });

    // scrambling code derived from (mcc, mnc, colour code)
    let cell = h.decoder.mac().cell();
    assert_eq!(cell.mcc(), TEST_MCC);
    assert_eq!(cell.mnc(), TEST_MNC);
    assert_eq!(cell.colour_code(), TEST_COLOUR);
    assert_eq!(cell.scrambling_code(), scrambler::tetra_scramb_get_init(TEST_MCC, TEST_MNC, TEST_COLOUR));

    // SYSINFO on BKN2 configured the downlink frequency
    assert_eq!(cell.downlink_frequency(), 467_562_500);

    let deliveries = h.llc.deliveries();
    assert_eq!(deliveries.len(), 2);

    // 29-bit D-MLE-SYNC SDU leading with MCC and MNC
    assert_eq!(deliveries[0].channel, LogicalChannel::Bsch);
    assert_eq!(deliveries[0].bits.len(), 29);
    assert_eq!(&deliveries[0].bits[0..10], "0011010000"); // 208
    assert_eq!(&deliveries[0].bits[10..24], "00000000000001"); // 1
    assert_eq!(deliveries[0].time, TdmaTime { t: 3, f: 18, m: 5 });

    // 42-bit D-MLE-SYSINFO SDU
    assert_eq!(deliveries[1].channel, LogicalChannel::SchHd);
    assert_eq!(deliveries[1].bits.len(), 42);

    assert_eq!(h.report.get("sync"), 1);
}

/// S2: a MAC-RESOURCE in signalling mode hands the LLC its SDU with the
/// parsed address.
#[test]
fn test_ndb_mac_resource() {
    let mut h = make_decoder();
    synchronize(&mut h);
    let before = h.llc.deliveries().len();

    // 8 octets: 43 header bits plus a 21-bit SDU
    let mut type1 = mac_resource_type1(0b001000, 0x123456, false);
    let payload = sdu_pattern(21);
    write_bitstr(&mut type1, &payload);

    let code = test_scrambling_code();
    let blk = encode_sch_f(type1, code);
    let bbk = encode_aach(0, 0, 0, code);
    feed_burst(&mut h.decoder, &build_ndb(false, &blk, &bbk));

    let deliveries = h.llc.deliveries();
    assert_eq!(deliveries.len(), before + 1);
    let d = &deliveries[before];
    assert_eq!(d.channel, LogicalChannel::SchF);
    assert_eq!(d.bits, payload);
    assert_eq!(d.address.ssi(), Some(0x123456));

    // the zero tail dissociates into exactly one null PDU
    assert_eq!(h.report.get("null-pdu"), 1);
}

/// S3: MAC-RESOURCE (fragmenting) + MAC-FRAG + MAC-END reassemble into one
/// SDU, delivered on MAC-END.
#[test]
fn test_fragmentation() {
    let mut h = make_decoder();
    synchronize(&mut h);
    let before = h.llc.deliveries().len();
    let code = test_scrambling_code();
    let bbk = encode_aach(0, 0, 0, code);

    let part1 = sdu_pattern(50);
    let part2: String = sdu_pattern(100).chars().rev().collect();
    let part3 = sdu_pattern(30);

    // fragmentation start: header + 50 SDU bits + fill marker
    let mut type1 = mac_resource_type1(mac_resource::LENGTH_IND_START_FRAG, 0xABCD, true);
    write_bitstr(&mut type1, &part1);
    type1.write_bit(1);
    feed_burst(&mut h.decoder, &build_ndb(false, &encode_sch_f(type1, code), &bbk));
    assert!(!h.decoder.mac().defrag_is_idle());

    // MAC-FRAG: type 01, subtype 0, fill bits present
    let mut type1 = BitBuffer::new_autoexpand(268);
    type1.write_bits(0b0101, 4);
    write_bitstr(&mut type1, &part2);
    type1.write_bit(1);
    feed_burst(&mut h.decoder, &build_ndb(false, &encode_sch_f(type1, code), &bbk));
    assert!(!h.decoder.mac().defrag_is_idle());

    // MAC-END with a 30-bit trailer
    let mut type1 = BitBuffer::new_autoexpand(268);
    let end = MacEnd {
        fill_bits: true,
        pos_of_grant: 0,
        length_ind: 0b000110,
        slot_granting_element: None,
        chan_alloc_element: None,
    };
    end.to_bitbuf(&mut type1);
    write_bitstr(&mut type1, &part3);
    type1.write_bit(1);
    feed_burst(&mut h.decoder, &build_ndb(false, &encode_sch_f(type1, code), &bbk));

    let deliveries = h.llc.deliveries();
    assert_eq!(deliveries.len(), before + 1);
    let d = &deliveries[before];
    assert_eq!(d.bits.len(), 180);
    assert_eq!(d.bits, format!("{}{}{}", part1, part2, part3));
    assert_eq!(d.address.ssi(), Some(0xABCD));

    assert!(h.decoder.mac().defrag_is_idle());
}

/// S4: NDB_SF in traffic mode with the second half slot stolen produces two
/// STCH deliveries in order.
#[test]
fn test_ndb_sf_stolen_second_slot() {
    let mut h = make_decoder();
    synchronize(&mut h);
    let code = test_scrambling_code();

    // one filler burst moves time off frame 18 ({4,18,5} -> {1,1,6})
    let filler = build_ndb(false, &encode_sch_f(BitBuffer::new(0), code), &encode_aach(0, 0, 0, code));
    feed_burst(&mut h.decoder, &filler);
    let before = h.llc.deliveries().len();

    // AACH header 01 with usage marker 5: traffic slot
    let bbk = encode_aach(1, 5, 0, code);

    // first half slot steals with "second half slot stolen too"
    let bkn1 = encode_sch_hd(mac_resource_type1(mac_resource::LENGTH_IND_SECOND_SLOT_STOLEN, 0x111111, false), code);
    // second half slot carries an ordinary MAC-RESOURCE (6 octets)
    let bkn2 = encode_sch_hd(mac_resource_type1(0b000110, 0x222222, false), code);

    let mut blk = bkn1.clone();
    blk.extend_from_slice(&bkn2);
    feed_burst(&mut h.decoder, &build_ndb(true, &blk, &bbk));

    assert_eq!(h.decoder.mac().time(), TdmaTime { t: 1, f: 1, m: 6 });
    assert!(h.decoder.mac().mac_state().downlink_usage.is_traffic());
    assert_eq!(h.decoder.mac().mac_state().downlink_usage, DownlinkUsage::Traffic(5));

    let deliveries = h.llc.deliveries();
    assert_eq!(deliveries.len(), before + 2);
    assert_eq!(deliveries[before].channel, LogicalChannel::Stch);
    assert_eq!(deliveries[before].address.ssi(), Some(0x111111));
    assert_eq!(deliveries[before + 1].channel, LogicalChannel::Stch);
    assert_eq!(deliveries[before + 1].address.ssi(), Some(0x222222));
    assert_eq!(deliveries[before + 1].bits.len(), 5);

    // nothing went to the U-plane, both half slots were signalling
    assert!(h.uplane.deliveries().is_empty());
}

/// S5: the synchronizer tolerates 50 missed bursts, reports loss once and
/// resynchronizes on the next aligned burst.
#[test]
fn test_sync_loss_and_recovery() {
    let mut h = make_decoder();
    synchronize(&mut h);
    let before = h.llc.deliveries().len();

    // 50 burst periods of silence exhaust the tolerance
    for _ in 0..(FRAME_LEN * 50) {
        h.decoder.rx_symbol(0);
    }
    assert!(!h.decoder.is_synchronized());
    assert_eq!(h.report.get("sync-lost"), 1);

    // silence after the loss does not re-report
    for _ in 0..FRAME_LEN {
        h.decoder.rx_symbol(0);
    }
    assert_eq!(h.report.get("sync-lost"), 1);

    // a fresh aligned burst restores sync and delivery
    let found = feed_burst(&mut h.decoder, &sync_burst());
    assert!(found);
    assert!(h.decoder.is_synchronized());
    assert_eq!(h.report.get("sync"), 2);
    assert!(h.llc.deliveries().len() >= before + 2);
}

/// S6: a null PDU is counted, produces no delivery and stops dissociation.
#[test]
fn test_null_pdu() {
    let mut h = make_decoder();
    synchronize(&mut h);
    let before = h.llc.deliveries().len();
    let code = test_scrambling_code();

    // an all-zero SCH/F block is a null MAC-RESOURCE
    let blk = encode_sch_f(BitBuffer::new(0), code);
    feed_burst(&mut h.decoder, &build_ndb(false, &blk, &encode_aach(0, 0, 0, code)));

    assert_eq!(h.llc.deliveries().len(), before);
    assert_eq!(h.report.get("null-pdu"), 1);
}

/// Two MAC-RESOURCE PDUs concatenated in one SCH/F block dissociate into
/// two LLC deliveries.
#[test]
fn test_pdu_dissociation() {
    let mut h = make_decoder();
    synchronize(&mut h);
    let before = h.llc.deliveries().len();
    let code = test_scrambling_code();

    // first PDU: 8 octets (43 header + 21 SDU bits)
    let mut type1 = mac_resource_type1(0b001000, 0x000100, false);
    let payload1 = sdu_pattern(21);
    write_bitstr(&mut type1, &payload1);

    // second PDU: 10 octets (43 header + 37 SDU bits)
    let second = mac_resource_type1(0b001010, 0x000200, false);
    let payload2: String = sdu_pattern(37).chars().rev().collect();
    let mut second_bits = second;
    write_bitstr(&mut second_bits, &payload2);
    second_bits.seek(0);
    let n = second_bits.get_len();
    type1.copy_bits(&mut second_bits, n);

    feed_burst(
        &mut h.decoder,
        &build_ndb(false, &encode_sch_f(type1, code), &encode_aach(0, 0, 0, code)),
    );

    let deliveries = h.llc.deliveries();
    assert_eq!(deliveries.len(), before + 2);
    assert_eq!(deliveries[before].bits, payload1);
    assert_eq!(deliveries[before].address.ssi(), Some(0x000100));
    assert_eq!(deliveries[before + 1].bits, payload2);
    assert_eq!(deliveries[before + 1].address.ssi(), Some(0x000200));

    // the zero tail behind the second PDU is one null PDU
    assert_eq!(h.report.get("null-pdu"), 1);
}

/// Traffic slots forward the raw descrambled block to the U-plane with the
/// usage marker's encryption mode.
#[test]
fn test_traffic_delivery() {
    let mut h = make_decoder();
    synchronize(&mut h);
    let code = test_scrambling_code();

    // leave frame 18 first
    let filler = build_ndb(false, &encode_sch_f(BitBuffer::new(0), code), &encode_aach(0, 0, 0, code));
    feed_burst(&mut h.decoder, &filler);

    // scramble the traffic pattern; the decoder undoes it
    let pattern = sdu_pattern(432);
    let mut block = BitBuffer::from_bitstr(&pattern);
    scrambler::tetra_scramb_bits(code, &mut block);
    let blk = block.into_bitvec();

    let bbk = encode_aach(1, 7, 0, code);
    feed_burst(&mut h.decoder, &build_ndb(false, &blk, &bbk));

    let deliveries = h.uplane.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].channel, LogicalChannel::TchS);
    assert_eq!(deliveries[0].bits, pattern);
    assert_eq!(deliveries[0].usage_marker, 7);
    assert_eq!(deliveries[0].encryption_mode, 0);
}

/// MAC-D-BLCK: implicit length, event label addressing.
#[test]
fn test_mac_d_block() {
    let mut h = make_decoder();
    synchronize(&mut h);
    let before = h.llc.deliveries().len();
    let code = test_scrambling_code();

    let mut type1 = BitBuffer::new(268);
    // type 11, subtype 0, no fill bits, encryption 1, event label 0x155
    type1.write_bits(0b11, 2);
    type1.write_bits(0, 1);
    type1.write_bits(0, 1);
    type1.write_bits(1, 2);
    type1.write_bits(0x155, 10);
    type1.write_bits(0, 1); // napping
    type1.write_bits(0, 1); // no slot granting
    let payload = sdu_pattern(250);
    write_bitstr(&mut type1, &payload);
    type1.seek(0);

    feed_burst(
        &mut h.decoder,
        &build_ndb(false, &encode_sch_f(type1, code), &encode_aach(0, 0, 0, code)),
    );

    let deliveries = h.llc.deliveries();
    assert_eq!(deliveries.len(), before + 1);
    let d = &deliveries[before];
    assert_eq!(d.bits, payload);
    assert_eq!(d.address.event_label(), Some(0x155));
    assert_eq!(d.address.encryption_mode, 1);
}
