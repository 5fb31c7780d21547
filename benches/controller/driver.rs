use criterion::{Criterion, Throughput};
use std::collections::BTreeMap;
use std::hint::black_box;

use libflash::controller::FmcDriver;
use libflash::mmio::MemoryBus;
use libflash::targets::stm32f405;

/// Frictionless controller model: never busy, never faults, stores writes.
/// Keeps the benches measuring the driver, not a simulated wait.
struct IdealController {
    registers: BTreeMap<u32, u32>,
    memory: Vec<u8>,
}

impl IdealController {
    fn new() -> Self {
        Self {
            registers: BTreeMap::new(),
            memory: vec![0xFF; stm32f405::DESCRIPTOR.total_size as usize],
        }
    }

    fn flash_index(&self, address: u32) -> Option<usize> {
        stm32f405::DESCRIPTOR
            .contains(address)
            .then(|| (address - stm32f405::DESCRIPTOR.base_address) as usize)
    }
}

impl MemoryBus for IdealController {
    fn read_u8(&mut self, address: u32) -> u8 {
        self.memory[self.flash_index(address).unwrap()]
    }

    fn read_u16(&mut self, address: u32) -> u16 {
        let at = self.flash_index(address).unwrap();
        u16::from_le_bytes([self.memory[at], self.memory[at + 1]])
    }

    fn read_u32(&mut self, address: u32) -> u32 {
        match self.flash_index(address) {
            Some(at) => u32::from_le_bytes([
                self.memory[at],
                self.memory[at + 1],
                self.memory[at + 2],
                self.memory[at + 3],
            ]),
            // Status reads as idle and fault-free; other registers as stored.
            None => *self.registers.get(&address).unwrap_or(&0),
        }
    }

    fn write_u8(&mut self, address: u32, value: u8) {
        if let Some(at) = self.flash_index(address) {
            self.memory[at] = value;
        } else {
            self.registers.insert(address, value as u32);
        }
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        let at = self.flash_index(address).unwrap();
        self.memory[at..at + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        match self.flash_index(address) {
            Some(at) => self.memory[at..at + 4].copy_from_slice(&value.to_le_bytes()),
            None => {
                self.registers.insert(address, value);
            }
        }
    }
}

pub fn bench_program_page(c: &mut Criterion) {
    let page = [0x5Au8; 512];
    let mut group = c.benchmark_group("fmc_driver");
    group.throughput(Throughput::Bytes(page.len() as u64));
    group.bench_function("program_page_512", |b| {
        let mut driver = FmcDriver::new(
            IdealController::new(),
            &stm32f405::REGISTERS,
            &stm32f405::DESCRIPTOR,
        );
        b.iter(|| driver.program(black_box(0x0800_0000), black_box(&page)).unwrap())
    });
    group.finish();
}

pub fn bench_erase_sector(c: &mut Criterion) {
    c.bench_function("fmc_driver/erase_sector", |b| {
        let mut driver = FmcDriver::new(
            IdealController::new(),
            &stm32f405::REGISTERS,
            &stm32f405::DESCRIPTOR,
        );
        b.iter(|| driver.erase_sector(black_box(0x0802_4000)).unwrap())
    });
}
