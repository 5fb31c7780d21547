use super::table::{DeviceTable, DRIVER_VERSION, SECTOR_END};
use super::*;

const BASE: u32 = 0x0800_0000;

// STM32F405-class geometry: 4 x 16 KB, 1 x 64 KB, 7 x 128 KB.
const MIXED: [SectorRange; 3] = [
    SectorRange {
        size: 0x4000,
        address: BASE,
    },
    SectorRange {
        size: 0x1_0000,
        address: BASE + 0x1_0000,
    },
    SectorRange {
        size: 0x2_0000,
        address: BASE + 0x2_0000,
    },
];

const MIXED_DESCRIPTOR: Descriptor = Descriptor {
    name: "MIXED 1024 KB Flash",
    class: MemoryClass::Onchip,
    base_address: BASE,
    total_size: 0x10_0000,
    page_size: 512,
    erased_value: 0xFF,
    program_timeout_ms: 1000,
    erase_timeout_ms: 10000,
    sectors: &MIXED,
};

const UNIFORM: [SectorRange; 1] = [SectorRange {
    size: 0x800,
    address: BASE,
}];

const UNIFORM_DESCRIPTOR: Descriptor = Descriptor {
    name: "UNIFORM 128 KB Flash",
    class: MemoryClass::Onchip,
    base_address: BASE,
    total_size: 0x2_0000,
    page_size: 2048,
    erased_value: 0xFF,
    program_timeout_ms: 1000,
    erase_timeout_ms: 10000,
    sectors: &UNIFORM,
};

#[test]
fn resolved_sector_contains_address() {
    let mut address = BASE;
    while address < MIXED_DESCRIPTOR.end_address() {
        let sector = MIXED_DESCRIPTOR.resolve_sector(address).unwrap();
        assert!(sector.contains(address), "address {address:#x}");
        address += 0x1000;
    }
}

#[test]
fn distinct_sectors_reconstruct_the_table() {
    // Walking every sector base must tile the array exactly.
    let mut address = BASE;
    let mut count = 0;
    while address < MIXED_DESCRIPTOR.end_address() {
        let sector = MIXED_DESCRIPTOR.resolve_sector(address).unwrap();
        assert_eq!(sector.address, address);
        assert_eq!(sector.index, count);
        count += 1;
        address = sector.end();
    }
    assert_eq!(address, MIXED_DESCRIPTOR.end_address());
    assert_eq!(count, MIXED_DESCRIPTOR.sector_count());
    assert_eq!(count, 12);
}

#[test]
fn out_of_range_addresses_fail() {
    assert_eq!(
        MIXED_DESCRIPTOR.resolve_sector(BASE - 1),
        Err(Error::OutOfRange)
    );
    assert_eq!(
        MIXED_DESCRIPTOR.resolve_sector(MIXED_DESCRIPTOR.end_address()),
        Err(Error::OutOfRange)
    );
    assert_eq!(MIXED_DESCRIPTOR.resolve_sector(0), Err(Error::OutOfRange));
}

#[test]
fn mixed_geometry_indices() {
    // Inside the single 64 KB sector.
    let sector = MIXED_DESCRIPTOR.resolve_sector(0x0801_4000).unwrap();
    assert_eq!(sector.index, 4);
    assert_eq!(sector.address, 0x0801_0000);
    assert_eq!(sector.size, 0x1_0000);

    // First 128 KB-class sector, after the 16 KB and 64 KB runs.
    let sector = MIXED_DESCRIPTOR.resolve_sector(0x0802_4000).unwrap();
    assert_eq!(sector.index, 5);
    assert_eq!(sector.address, 0x0802_0000);
    assert_eq!(sector.size, 0x2_0000);
}

#[test]
fn first_and_last_byte_resolve() {
    let first = MIXED_DESCRIPTOR.resolve_sector(BASE).unwrap();
    assert_eq!((first.index, first.address), (0, BASE));

    let last = MIXED_DESCRIPTOR
        .resolve_sector(MIXED_DESCRIPTOR.end_address() - 1)
        .unwrap();
    assert_eq!(last.index, 11);
    assert_eq!(last.end(), MIXED_DESCRIPTOR.end_address());
}

#[test]
fn uniform_geometry_is_a_flat_shift() {
    let sector = UNIFORM_DESCRIPTOR.resolve_sector(BASE + 0x1234).unwrap();
    assert_eq!(sector.index, 2);
    assert_eq!(sector.address, BASE + 0x1000);
    assert_eq!(sector.size, 0x800);
    assert_eq!(UNIFORM_DESCRIPTOR.sector_count(), 64);
}

#[test]
fn table_image_layout() {
    const TABLE: DeviceTable<8> = DeviceTable::from_descriptor(&MIXED_DESCRIPTOR);

    assert_eq!(TABLE.version, DRIVER_VERSION);
    assert_eq!(TABLE.reserved, 0);
    assert_eq!(TABLE.erased_value, 0xFF);
    assert_eq!(TABLE.base_address, BASE);

    // Name is NUL padded.
    assert_eq!(&TABLE.name[..19], MIXED_DESCRIPTOR.name.as_bytes());
    assert!(TABLE.name[19..].iter().all(|&b| b == 0));

    // Sector addresses are relative to the base; the table is
    // sentinel-terminated and padded with sentinels.
    assert_eq!(TABLE.sectors[0].address, 0);
    assert_eq!(TABLE.sectors[1].address, 0x1_0000);
    assert_eq!(TABLE.sectors[2].address, 0x2_0000);
    assert_eq!(TABLE.sectors[3], SECTOR_END);
    assert_eq!(TABLE.sectors[7], SECTOR_END);
}

#[test]
fn json_export() {
    let json = MIXED_DESCRIPTOR.to_json::<512>().unwrap();
    assert!(json.contains("\"name\":\"MIXED 1024 KB Flash\""));
    assert!(json.contains("\"page_size\":512"));

    // Undersized buffer reports an encode error instead of truncating.
    assert_eq!(
        MIXED_DESCRIPTOR.to_json::<16>(),
        Err::<heapless::String<16>, _>(Error::Encode)
    );
}
