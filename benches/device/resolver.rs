use criterion::Criterion;
use std::hint::black_box;

use libflash::targets::{stm32f405, stm32l486};

pub fn bench_resolve_mixed_geometry(c: &mut Criterion) {
    let descriptor = &stm32f405::DESCRIPTOR;
    let addresses = [0x0800_0000u32, 0x0800_F000, 0x0801_4000, 0x0807_0000, 0x080F_FFFF];

    c.bench_function("resolve_sector/mixed", |b| {
        b.iter(|| {
            for &address in &addresses {
                black_box(descriptor.resolve_sector(black_box(address)).unwrap());
            }
        })
    });
}

pub fn bench_resolve_uniform_geometry(c: &mut Criterion) {
    let descriptor = &stm32l486::DESCRIPTOR;

    c.bench_function("resolve_sector/uniform", |b| {
        b.iter(|| {
            let mut address = 0x0800_0000u32;
            while address < 0x0810_0000 {
                black_box(descriptor.resolve_sector(black_box(address)).unwrap());
                address += 0x1_0000;
            }
        })
    });
}
