//! Shared simulated target for integration tests.
//!
//! One register-file-plus-flash model that emulates any controller a
//! `RegisterMap` can describe: it decodes the unlock sequence, the enable
//! bits, the sector-number field or erase-address register, and the start
//! strobe using the same map and descriptor the driver under test uses, so
//! every supported variant exercises the identical simulator code. Fault
//! and read-back-corruption injection are programmable.

// Each integration test crate compiles its own copy and uses a subset.
#![allow(dead_code)]

use std::collections::BTreeMap;

use libflash::controller::{RegisterMap, SectorSelect};
use libflash::device::Descriptor;
use libflash::mmio::MemoryBus;

/// Everything observable the driver did to the hardware, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A write to the key register.
    Key(u32),
    /// A control-register write.
    Control(u32),
    /// The control-register value at the moment a command started.
    Command(u32),
    /// A write to the erase-address register.
    EraseAddress(u32),
    /// A data write into the flash array.
    Data { address: u32, width: u8 },
    /// A write to a system register outside the controller and the array.
    System { address: u32, value: u32 },
}

/// Simulated flash controller and array.
pub struct SimController {
    map: &'static RegisterMap,
    descriptor: &'static Descriptor,
    pub memory: Vec<u8>,
    pub journal: Vec<Event>,
    control: u32,
    status: u32,
    erase_address: u32,
    system: BTreeMap<u32, u32>,
    key_stage: u8,
    busy_reads: u8,
    /// When set, the next completed command raises an error flag.
    pub inject_fault: bool,
    /// When set, reads of the flash array at this address come back inverted.
    pub corrupt_read_at: Option<u32>,
}

impl SimController {
    pub fn new(map: &'static RegisterMap, descriptor: &'static Descriptor) -> Self {
        Self {
            map,
            descriptor,
            memory: vec![descriptor.erased_value; descriptor.total_size as usize],
            journal: Vec::new(),
            control: map.lock,
            status: 0,
            erase_address: 0,
            system: BTreeMap::new(),
            key_stage: 0,
            busy_reads: 0,
            inject_fault: false,
            corrupt_read_at: None,
        }
    }

    /// Fill the array with a marker pattern so erases are observable.
    pub fn fill(&mut self, value: u8) {
        self.memory.fill(value);
    }

    /// Latch a stale error flag, as a previously failed session would have.
    pub fn raise_stale_fault(&mut self) {
        self.status |= self.map.error_flags & self.map.error_flags.wrapping_neg();
    }

    /// Raw status-register value, busy bit aside.
    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn erased(&self, from: u32, to: u32) -> bool {
        let from = self.flash_index(from);
        let to = self.flash_index(to - 1) + 1;
        self.memory[from..to]
            .iter()
            .all(|&b| b == self.descriptor.erased_value)
    }

    pub fn locked(&self) -> bool {
        self.control & self.map.lock != 0
    }

    /// Control-register value, for asserting enable bits were cleared.
    pub fn control(&self) -> u32 {
        self.control
    }

    /// System-register write log lookup.
    pub fn system_register(&self, address: u32) -> Option<u32> {
        self.system.get(&address).copied()
    }

    fn flash_index(&self, address: u32) -> usize {
        assert!(
            self.descriptor.contains(address),
            "simulated access at {address:#010x} outside flash"
        );
        (address - self.descriptor.base_address) as usize
    }

    fn is_flash(&self, address: u32) -> bool {
        self.descriptor.contains(address)
    }

    /// Flat index -> (base address, size), the inverse of sector resolution.
    fn sector_at_index(&self, index: u32) -> (u32, u32) {
        let mut remaining = index;
        let sectors = self.descriptor.sectors;
        for (i, run) in sectors.iter().enumerate() {
            let bound = match sectors.get(i + 1) {
                Some(next) => next.address,
                None => self.descriptor.end_address(),
            };
            let count = (bound - run.address) / run.size;
            if remaining < count {
                return (run.address + remaining * run.size, run.size);
            }
            remaining -= count;
        }
        panic!("simulated erase of sector index {index} beyond the table");
    }

    fn finish_command(&mut self) {
        if self.inject_fault {
            self.inject_fault = false;
            // Raise the lowest error flag the map defines.
            self.status |= self.map.error_flags & self.map.error_flags.wrapping_neg();
        }
        self.busy_reads = 2;
    }

    fn run_command(&mut self) {
        self.journal.push(Event::Command(self.control));
        if self.control & self.map.mass_erase == self.map.mass_erase {
            let erased = self.descriptor.erased_value;
            self.memory.fill(erased);
        } else if self.control & self.map.sector_erase != 0 {
            let (base, size) = match self.map.sector_select {
                SectorSelect::Index {
                    shift, mask, bank, ..
                } => {
                    let mut index = (self.control & mask) >> shift;
                    if let Some(bank) = bank {
                        if self.control & bank.select != 0 {
                            index += bank.capacity;
                        }
                    }
                    self.sector_at_index(index)
                }
                SectorSelect::AddressRegister { .. } => {
                    let address = self.erase_address;
                    let mut base = address;
                    let mut size = 0;
                    for (i, run) in self.descriptor.sectors.iter().enumerate() {
                        let bound = match self.descriptor.sectors.get(i + 1) {
                            Some(next) => next.address,
                            None => self.descriptor.end_address(),
                        };
                        if address >= run.address && address < bound {
                            size = run.size;
                            base = address - (address - run.address) % run.size;
                        }
                    }
                    (base, size)
                }
            };
            let from = self.flash_index(base);
            let erased = self.descriptor.erased_value;
            self.memory[from..from + size as usize].fill(erased);
        }
        self.finish_command();
    }

    fn store(&mut self, address: u32, bytes: &[u8]) {
        if self.control & self.map.program != 0 {
            let at = self.flash_index(address);
            self.memory[at..at + bytes.len()].copy_from_slice(bytes);
            self.finish_command();
        }
    }

    fn read_flash(&mut self, address: u32, width: usize) -> u32 {
        let at = self.flash_index(address);
        let mut value = 0u32;
        for (i, &byte) in self.memory[at..at + width].iter().enumerate() {
            value |= (byte as u32) << (8 * i);
        }
        if self.corrupt_read_at == Some(address) {
            value = !value & (u32::MAX >> (32 - 8 * width as u32));
        }
        value
    }
}

impl MemoryBus for SimController {
    fn read_u8(&mut self, address: u32) -> u8 {
        self.read_flash(address, 1) as u8
    }

    fn read_u16(&mut self, address: u32) -> u16 {
        self.read_flash(address, 2) as u16
    }

    fn read_u32(&mut self, address: u32) -> u32 {
        if address == self.map.status_register {
            if self.busy_reads > 0 {
                self.busy_reads -= 1;
                self.status | self.map.busy
            } else {
                self.status
            }
        } else if address == self.map.control_register {
            self.control
        } else if let SectorSelect::AddressRegister { register } = self.map.sector_select {
            if address == register {
                self.erase_address
            } else if self.is_flash(address) {
                self.read_flash(address, 4)
            } else {
                self.system.get(&address).copied().unwrap_or(0)
            }
        } else if self.is_flash(address) {
            self.read_flash(address, 4)
        } else {
            self.system.get(&address).copied().unwrap_or(0)
        }
    }

    fn write_u8(&mut self, address: u32, value: u8) {
        if self.is_flash(address) {
            self.journal.push(Event::Data { address, width: 1 });
            self.store(address, &[value]);
        } else {
            self.journal.push(Event::System {
                address,
                value: value as u32,
            });
            self.system.insert(address, value as u32);
        }
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        self.journal.push(Event::Data { address, width: 2 });
        self.store(address, &value.to_le_bytes());
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        if address == self.map.key_register {
            self.journal.push(Event::Key(value));
            self.key_stage = match (self.key_stage, value) {
                (0, key) if key == self.map.unlock_keys[0] => 1,
                (1, key) if key == self.map.unlock_keys[1] => {
                    self.control &= !self.map.lock;
                    0
                }
                _ => 0,
            };
        } else if address == self.map.status_register {
            self.status &= !(value & self.map.sticky_flags);
        } else if address == self.map.control_register {
            let started = value & self.map.start != 0 && self.control & self.map.start == 0;
            self.control = value;
            self.journal.push(Event::Control(value));
            if started {
                self.run_command();
                self.control &= !self.map.start;
            }
        } else if matches!(
            self.map.sector_select,
            SectorSelect::AddressRegister { register } if register == address
        ) {
            self.journal.push(Event::EraseAddress(value));
            self.erase_address = value;
        } else if self.is_flash(address) {
            self.journal.push(Event::Data { address, width: 4 });
            self.store(address, &value.to_le_bytes());
        } else {
            self.journal.push(Event::System { address, value });
            self.system.insert(address, value);
        }
    }
}
