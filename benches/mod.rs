use criterion::{criterion_group, criterion_main};

mod controller;
mod device;

criterion_group!(
    benches,
    device::resolver::bench_resolve_mixed_geometry,
    device::resolver::bench_resolve_uniform_geometry,
    controller::driver::bench_program_page,
    controller::driver::bench_erase_sector
);
criterion_main!(benches);
