//! Instruction semantics through the public API: load a few bytes, step,
//! check registers, flags and memory.

use emu_core::{Cpu, Peek, SimpleBus};
use zilog_z80::{CF, CpuState, HF, NF, PF, SF, XF, YF, Z80, ZF};

/// CPU at PC=0 with flags cleared, and `code` loaded at 0.
fn machine(code: &[u8]) -> (Z80, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, code);
    let mut cpu = Z80::new();
    cpu.registers_mut().f = 0;
    (cpu, bus)
}

fn steps(cpu: &mut Z80, bus: &mut SimpleBus, count: usize) -> u32 {
    (0..count).map(|_| cpu.step(bus)).sum()
}

#[test]
fn state_round_trip_for_every_pair_value() {
    let mut cpu = Z80::new();
    for high in 0..=0xFFu8 {
        let value = u16::from_be_bytes([high, high ^ 0x5A]);
        let state = CpuState {
            af: value,
            bc: !value,
            de: value.rotate_left(3),
            hl: value.wrapping_mul(7),
            af_alt: value ^ 0x1111,
            bc_alt: value ^ 0x2222,
            de_alt: value ^ 0x4444,
            hl_alt: value ^ 0x8888,
            ix: value.swap_bytes(),
            iy: !value.swap_bytes(),
            sp: value.wrapping_add(2),
            pc: value.wrapping_sub(2),
            i: high,
            r: !high,
            im: high % 3,
            iff1: high & 1 != 0,
            iff2: high & 2 != 0,
        };
        cpu.set_state(&state);
        assert_eq!(cpu.state(), state);
        let again = cpu.state();
        cpu.set_state(&again);
        assert_eq!(cpu.state(), state);
    }
}

#[test]
fn add_then_sub_restores_accumulator() {
    // ADD A,B; SUB B
    let (mut cpu, mut bus) = machine(&[0x80, 0x90]);
    for a in 0..=0xFFu8 {
        for b in 0..=0xFFu8 {
            let regs = cpu.registers_mut();
            regs.pc = 0;
            regs.a = a;
            regs.b = b;
            regs.f = 0;
            steps(&mut cpu, &mut bus, 2);

            let regs = cpu.registers();
            assert_eq!(regs.a, a, "A after ADD/SUB {a:02X},{b:02X}");
            assert_ne!(regs.f & NF, 0);
            // SUB borrows exactly when the ADD carried
            let carried = u16::from(a) + u16::from(b) > 0xFF;
            assert_eq!(regs.f & CF != 0, carried, "carry for {a:02X},{b:02X}");
        }
    }
}

#[test]
fn daa_after_0x9a() {
    // LD A,9Ah; DAA
    let (mut cpu, mut bus) = machine(&[0x3E, 0x9A, 0x27]);
    steps(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.registers().a, 0x00);
    assert_eq!(cpu.registers().f, ZF | HF | PF | CF);
}

#[test]
fn rlca_on_0x55() {
    let (mut cpu, mut bus) = machine(&[0x07]);
    cpu.registers_mut().a = 0x55;
    cpu.registers_mut().f = HF | NF;
    cpu.step(&mut bus);
    assert_eq!(cpu.registers().a, 0xAA);
    // X/Y are copies of bits 3 and 5 of the result
    assert_eq!(cpu.registers().f & !(XF | YF), 0);
    assert_eq!(cpu.registers().f & (XF | YF), XF | YF);
}

#[test]
fn ldir_copies_and_stops() {
    // LDIR; HALT
    let (mut cpu, mut bus) = machine(&[0xED, 0xB0, 0x76]);
    bus.load(0x4000, &[0x11, 0x22, 0x33, 0x44]);
    let regs = cpu.registers_mut();
    regs.set_hl(0x4000);
    regs.set_de(0x5000);
    regs.set_bc(3);

    assert_eq!(cpu.step(&mut bus), 21);
    assert_eq!(cpu.pc(), 0x0000);
    assert_eq!(cpu.step(&mut bus), 21);
    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(cpu.pc(), 0x0002);

    let regs = cpu.registers();
    assert_eq!(regs.bc(), 0);
    assert_eq!(regs.hl(), 0x4003);
    assert_eq!(regs.de(), 0x5003);
    assert_eq!(regs.f & PF, 0);
    assert_eq!(&bus.memory()[0x5000..0x5004], &[0x11, 0x22, 0x33, 0x00]);
}

#[test]
fn cpir_stops_on_match() {
    // CPIR
    let (mut cpu, mut bus) = machine(&[0xED, 0xB1]);
    bus.load(0x4000, &[0x01, 0x02, 0x03, 0x04]);
    let regs = cpu.registers_mut();
    regs.a = 0x03;
    regs.set_hl(0x4000);
    regs.set_bc(10);

    assert_eq!(steps(&mut cpu, &mut bus, 3), 21 + 21 + 16);
    let regs = cpu.registers();
    assert_eq!(regs.pc, 0x0002);
    assert_eq!(regs.hl(), 0x4003);
    assert_eq!(regs.bc(), 7);
    assert_ne!(regs.f & ZF, 0);
    assert_ne!(regs.f & PF, 0);
}

#[test]
fn lddr_copies_downward() {
    // LDDR
    let (mut cpu, mut bus) = machine(&[0xED, 0xB8]);
    bus.load(0x4000, &[0x11, 0x22, 0x33]);
    let regs = cpu.registers_mut();
    regs.set_hl(0x4002);
    regs.set_de(0x5002);
    regs.set_bc(3);

    assert_eq!(steps(&mut cpu, &mut bus, 3), 21 + 21 + 16);
    let regs = cpu.registers();
    assert_eq!(regs.pc, 0x0002);
    assert_eq!(regs.hl(), 0x3FFF);
    assert_eq!(regs.de(), 0x4FFF);
    assert_eq!(regs.bc(), 0);
    assert_eq!(&bus.memory()[0x5000..0x5003], &[0x11, 0x22, 0x33]);
}

#[test]
fn cpdr_searches_downward() {
    // CPDR
    let (mut cpu, mut bus) = machine(&[0xED, 0xB9]);
    bus.load(0x4000, &[0x11, 0x22, 0x33]);
    let regs = cpu.registers_mut();
    regs.a = 0x11;
    regs.set_hl(0x4002);
    regs.set_bc(10);

    assert_eq!(steps(&mut cpu, &mut bus, 3), 21 + 21 + 16);
    let regs = cpu.registers();
    assert_eq!(regs.pc, 0x0002);
    assert_eq!(regs.hl(), 0x3FFF);
    assert_eq!(regs.bc(), 7);
    assert_ne!(regs.f & ZF, 0);
    assert_ne!(regs.f & PF, 0);
}

#[test]
fn otir_counts_b_down_on_the_port_address() {
    // OTIR
    let (mut cpu, mut bus) = machine(&[0xED, 0xB3]);
    bus.load(0x4000, &[0x01, 0x02, 0x03]);
    let regs = cpu.registers_mut();
    regs.set_hl(0x4000);
    regs.set_bc(0x0310);

    assert_eq!(cpu.step(&mut bus), 21);
    assert_eq!(cpu.pc(), 0x0000);
    assert_eq!(bus.take_port_writes(), vec![(0x0210, 0x01)]);
    assert_eq!(steps(&mut cpu, &mut bus, 2), 21 + 16);
    assert_eq!(cpu.pc(), 0x0002);

    // B is decremented before the write, so it drives the new value
    assert_eq!(bus.take_port_writes(), vec![(0x0110, 0x02), (0x0010, 0x03)]);
    assert_eq!(cpu.registers().hl(), 0x4003);
    assert_eq!(cpu.registers().b, 0);
    assert_ne!(cpu.registers().f & ZF, 0);
}

#[test]
fn indr_fills_memory_downward() {
    // INDR
    let (mut cpu, mut bus) = machine(&[0xED, 0xBA]);
    // B is sampled before the decrement
    bus.set_port_input(0x0220, 0xAA);
    bus.set_port_input(0x0120, 0xBB);
    let regs = cpu.registers_mut();
    regs.set_hl(0x5001);
    regs.set_bc(0x0220);

    assert_eq!(steps(&mut cpu, &mut bus, 2), 21 + 16);
    assert_eq!(&bus.memory()[0x5000..0x5002], &[0xBB, 0xAA]);
    assert_eq!(cpu.registers().hl(), 0x4FFF);
    assert_eq!(cpu.registers().b, 0);
    assert_eq!(cpu.pc(), 0x0002);
}

#[test]
fn ini_flags() {
    // INI with a carry out of byte + (C+1)
    let (mut cpu, mut bus) = machine(&[0xED, 0xA2]);
    bus.set_port_input(0x1005, 0xFF);
    cpu.registers_mut().set_bc(0x1005);
    cpu.registers_mut().set_hl(0x5000);
    cpu.step(&mut bus);
    assert_eq!(bus.peek(0x5000), 0xFF);
    assert_eq!(cpu.registers().b, 0x0F);
    // B=0Fh gives X; bit 7 of the byte gives N; 0x105 carries into H and C;
    // parity of (5 ^ 0Fh) is even
    assert_eq!(cpu.registers().f, XF | NF | HF | CF | PF);
    assert_eq!(cpu.memptr(), 0x1006);

    // no carry, B reaches zero
    let (mut cpu, mut bus) = machine(&[0xED, 0xA2]);
    bus.set_port_input(0x01FF, 0x80);
    cpu.registers_mut().set_bc(0x01FF);
    cpu.registers_mut().set_hl(0x5000);
    cpu.step(&mut bus);
    assert_eq!(cpu.registers().f, ZF | NF | PF);
}

#[test]
fn outi_flags() {
    // OUTI: k is the byte plus the incremented L
    let (mut cpu, mut bus) = machine(&[0xED, 0xA3]);
    bus.poke(0x4010, 0xF0);
    cpu.registers_mut().set_bc(0x2110);
    cpu.registers_mut().set_hl(0x4010);
    cpu.step(&mut bus);
    assert_eq!(bus.port_writes(), &[(0x2010, 0xF0)]);
    // B=20h gives Y; F0h+11h carries; parity of (1 ^ 20h) is even
    assert_eq!(cpu.registers().f, YF | NF | HF | CF | PF);

    let (mut cpu, mut bus) = machine(&[0xED, 0xA3]);
    bus.poke(0x40FF, 0x01);
    cpu.registers_mut().set_bc(0x0110);
    cpu.registers_mut().set_hl(0x40FF);
    cpu.step(&mut bus);
    assert_eq!(cpu.registers().hl(), 0x4100);
    assert_eq!(cpu.registers().f, ZF);
}

/// DAA as a table lookup: correction from the digit ranges, then an
/// ordinary 8-bit add or subtract of the correction.
fn daa_reference(a: u8, f: u8) -> (u8, u8) {
    let low = a & 0x0F;
    let mut correction = 0u8;
    let mut carry = f & CF != 0;
    if f & HF != 0 || low > 9 {
        correction += 0x06;
    }
    if carry || a > 0x99 {
        correction += 0x60;
        carry = true;
    }
    let (result, half) = if f & NF != 0 {
        (a.wrapping_sub(correction), low < (correction & 0x0F))
    } else {
        (a.wrapping_add(correction), low + (correction & 0x0F) > 0x0F)
    };

    let mut flags = (result & (SF | YF | XF)) | (f & NF);
    if result == 0 {
        flags |= ZF;
    }
    if result.count_ones() % 2 == 0 {
        flags |= PF;
    }
    if half {
        flags |= HF;
    }
    if carry {
        flags |= CF;
    }
    (result, flags)
}

#[test]
fn daa_truth_table() {
    let (mut cpu, mut bus) = machine(&[0x27]);
    for a in 0..=0xFFu8 {
        for inputs in 0..8u8 {
            let f = (if inputs & 1 != 0 { NF } else { 0 })
                | (if inputs & 2 != 0 { HF } else { 0 })
                | (if inputs & 4 != 0 { CF } else { 0 });
            let regs = cpu.registers_mut();
            regs.pc = 0;
            regs.a = a;
            regs.f = f;
            cpu.step(&mut bus);

            let (value, flags) = daa_reference(a, f);
            assert_eq!(cpu.registers().a, value, "A for DAA {a:02X} F={f:02X}");
            assert_eq!(cpu.registers().f, flags, "F for DAA {a:02X} F={f:02X}");
        }
    }
}

#[test]
fn indexed_load_and_store() {
    // LD IX,1234h; LD (IX+5),77h; LD A,(IX+5); LD IY,2000h; LD (IY-3),A
    let (mut cpu, mut bus) = machine(&[
        0xDD, 0x21, 0x34, 0x12, 0xDD, 0x36, 0x05, 0x77, 0xDD, 0x7E, 0x05, 0xFD, 0x21, 0x00,
        0x20, 0xFD, 0x77, 0xFD,
    ]);
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.step(&mut bus), 19);
    assert_eq!(cpu.step(&mut bus), 19);
    steps(&mut cpu, &mut bus, 2);

    assert_eq!(bus.peek(0x1239), 0x77);
    assert_eq!(cpu.registers().a, 0x77);
    assert_eq!(bus.peek(0x1FFD), 0x77);
    assert_eq!(cpu.memptr(), 0x1FFD);
}

#[test]
fn index_halves_and_h_l_with_displacement() {
    // LD IXH,12h; LD IXL,34h; LD H,(IX+0)
    let (mut cpu, mut bus) = machine(&[0xDD, 0x26, 0x12, 0xDD, 0x2E, 0x34, 0xDD, 0x66, 0x00]);
    bus.poke(0x1234, 0xAB);
    cpu.registers_mut().set_hl(0x5555);
    steps(&mut cpu, &mut bus, 3);

    let regs = cpu.registers();
    assert_eq!(regs.ix, 0x1234);
    // the (IX+d) form loads the real H, not IXH
    assert_eq!(regs.h, 0xAB);
    assert_eq!(regs.l, 0x55);
}

#[test]
fn ex_de_hl_ignores_index_prefix() {
    // DD EB
    let (mut cpu, mut bus) = machine(&[0xDD, 0xEB]);
    let regs = cpu.registers_mut();
    regs.set_de(0x1111);
    regs.set_hl(0x2222);
    regs.ix = 0x3333;
    assert_eq!(cpu.step(&mut bus), 8);
    let regs = cpu.registers();
    assert_eq!(regs.de(), 0x2222);
    assert_eq!(regs.hl(), 0x1111);
    assert_eq!(regs.ix, 0x3333);
}

#[test]
fn prefix_on_plain_instruction_costs_four_more() {
    // DD LD A,5
    let (mut cpu, mut bus) = machine(&[0xDD, 0x3E, 0x05]);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.registers().a, 5);
    assert_eq!(cpu.registers().r, 2);
}

#[test]
fn sll_shifts_in_a_one() {
    // SLL B
    let (mut cpu, mut bus) = machine(&[0xCB, 0x30]);
    cpu.registers_mut().b = 0x80;
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.registers().b, 0x01);
    assert_ne!(cpu.registers().f & CF, 0);
}

#[test]
fn indexed_rotate_copies_into_register() {
    // LD IX,3000h; RLC (IX+2),B
    let (mut cpu, mut bus) = machine(&[0xDD, 0x21, 0x00, 0x30, 0xDD, 0xCB, 0x02, 0x00]);
    bus.poke(0x3002, 0x81);
    cpu.step(&mut bus);
    assert_eq!(cpu.step(&mut bus), 23);
    assert_eq!(bus.peek(0x3002), 0x03);
    assert_eq!(cpu.registers().b, 0x03);
    assert_ne!(cpu.registers().f & CF, 0);
    // the operation byte is not an M1 fetch: two for DD CB, two for LD IX
    assert_eq!(cpu.registers().r, 4);
}

#[test]
fn indexed_bit_takes_xy_from_address() {
    // LD IX,2800h; BIT 0,(IX+0)
    let (mut cpu, mut bus) = machine(&[0xDD, 0x21, 0x00, 0x28, 0xDD, 0xCB, 0x00, 0x46]);
    bus.poke(0x2800, 0x01);
    cpu.step(&mut bus);
    assert_eq!(cpu.step(&mut bus), 20);
    let f = cpu.registers().f;
    assert_eq!(f & ZF, 0);
    assert_eq!(f & (XF | YF), XF | YF);
}

#[test]
fn bit_hl_leaks_memptr_into_xy() {
    // LD A,(28FFh); BIT 0,(HL)
    let (mut cpu, mut bus) = machine(&[0x3A, 0xFF, 0x28, 0xCB, 0x46]);
    cpu.registers_mut().set_hl(0x4000);
    cpu.step(&mut bus);
    assert_eq!(cpu.memptr(), 0x2900);
    assert_eq!(cpu.step(&mut bus), 12);
    let f = cpu.registers().f;
    assert_ne!(f & ZF, 0);
    assert_ne!(f & HF, 0);
    // 0x29 has bit 3 set and bit 5 set
    assert_eq!(f & (XF | YF), XF | YF);
}

#[test]
fn memptr_after_jump_and_call() {
    // JP 0010h ... 0010: CALL 0020h
    let (mut cpu, mut bus) = machine(&[0xC3, 0x10, 0x00]);
    bus.load(0x0010, &[0xCD, 0x20, 0x00]);
    cpu.registers_mut().sp = 0x8000;
    cpu.step(&mut bus);
    assert_eq!(cpu.memptr(), 0x0010);
    assert_eq!(cpu.step(&mut bus), 17);
    assert_eq!(cpu.memptr(), 0x0020);
    assert_eq!(bus.peek_word(0x7FFE), 0x0013);
}

#[test]
fn scf_xy_depends_on_previous_flag_write() {
    // CP 28h; SCF: the previous instruction wrote F, so X/Y come from A
    let (mut cpu, mut bus) = machine(&[0xFE, 0x28, 0x37]);
    cpu.registers_mut().a = 0x00;
    steps(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.registers().f & (XF | YF), 0);
    assert_ne!(cpu.registers().f & CF, 0);

    // NOP; SCF: F was not written, so the old X/Y survive
    let (mut cpu, mut bus) = machine(&[0x00, 0x37]);
    cpu.registers_mut().a = 0x00;
    cpu.registers_mut().f = XF | YF;
    steps(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.registers().f & (XF | YF), XF | YF);
}

#[test]
fn ccf_moves_carry_to_half_carry() {
    // SCF; CCF
    let (mut cpu, mut bus) = machine(&[0x37, 0x3F]);
    steps(&mut cpu, &mut bus, 2);
    let f = cpu.registers().f;
    assert_eq!(f & CF, 0);
    assert_ne!(f & HF, 0);
    assert_eq!(f & NF, 0);
}

#[test]
fn neg_of_one() {
    // LD A,1; NEG
    let (mut cpu, mut bus) = machine(&[0x3E, 0x01, 0xED, 0x44]);
    steps(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.registers().a, 0xFF);
    let f = cpu.registers().f;
    assert_ne!(f & SF, 0);
    assert_ne!(f & NF, 0);
    assert_ne!(f & CF, 0);
}

#[test]
fn sixteen_bit_arithmetic() {
    // LD HL,FFFFh; LD BC,0001h; ADD HL,BC; SBC HL,BC
    let (mut cpu, mut bus) = machine(&[0x21, 0xFF, 0xFF, 0x01, 0x01, 0x00, 0x09, 0xED, 0x42]);
    steps(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.registers().hl(), 0x0000);
    assert_ne!(cpu.registers().f & CF, 0);
    assert_eq!(cpu.memptr(), 0x0000);

    // 0 - 1 - carry
    assert_eq!(cpu.step(&mut bus), 15);
    assert_eq!(cpu.registers().hl(), 0xFFFE);
    let f = cpu.registers().f;
    assert_ne!(f & CF, 0);
    assert_ne!(f & NF, 0);
    assert_ne!(f & SF, 0);
}

#[test]
fn exchange_instructions() {
    // EX AF,AF'; EXX
    let (mut cpu, mut bus) = machine(&[0x08, 0xD9]);
    let regs = cpu.registers_mut();
    regs.set_af(0x1234);
    regs.set_af_alt(0x5678);
    regs.set_bc(0x1111);
    regs.set_bc_alt(0x2222);
    regs.set_hl(0x3333);
    regs.set_hl_alt(0x4444);
    steps(&mut cpu, &mut bus, 2);

    let regs = cpu.registers();
    assert_eq!(regs.af(), 0x5678);
    assert_eq!(regs.af_alt(), 0x1234);
    assert_eq!(regs.bc(), 0x2222);
    assert_eq!(regs.hl(), 0x4444);
    assert_eq!(regs.hl_alt(), 0x3333);
}

#[test]
fn rld_and_rrd() {
    // RLD; RRD
    let (mut cpu, mut bus) = machine(&[0xED, 0x6F, 0xED, 0x67]);
    bus.poke(0x5000, 0x34);
    cpu.registers_mut().a = 0x12;
    cpu.registers_mut().set_hl(0x5000);

    assert_eq!(cpu.step(&mut bus), 18);
    assert_eq!(cpu.registers().a, 0x13);
    assert_eq!(bus.peek(0x5000), 0x42);

    cpu.step(&mut bus);
    assert_eq!(cpu.registers().a, 0x12);
    assert_eq!(bus.peek(0x5000), 0x34);
}

#[test]
fn port_io_uses_b_and_a_as_high_byte() {
    // LD A,7Fh; IN A,(FEh); LD BC,12FEh; OUT (C),A; OUT (C),0
    let (mut cpu, mut bus) = machine(&[
        0x3E, 0x7F, 0xDB, 0xFE, 0x01, 0xFE, 0x12, 0xED, 0x79, 0xED, 0x71,
    ]);
    bus.set_port_input(0x7FFE, 0xBF);
    cpu.step(&mut bus);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.registers().a, 0xBF);
    assert_eq!(cpu.memptr(), 0x7FFF);

    steps(&mut cpu, &mut bus, 3);
    assert_eq!(bus.port_writes(), &[(0x12FE, 0xBF), (0x12FE, 0x00)]);
}

#[test]
fn in_f_sets_flags_only() {
    // IN F,(C)
    let (mut cpu, mut bus) = machine(&[0xED, 0x70]);
    bus.set_port_input(0x0010, 0x00);
    let regs = cpu.registers_mut();
    regs.set_bc(0x0010);
    regs.set_hl(0xABCD);
    let before = cpu.state();
    cpu.step(&mut bus);

    assert_ne!(cpu.registers().f & ZF, 0);
    assert_ne!(cpu.registers().f & PF, 0);
    let after = cpu.state();
    assert_eq!(after.bc, before.bc);
    assert_eq!(after.hl, before.hl);
    assert_eq!(after.af >> 8, before.af >> 8);
}

#[test]
fn reserved_ed_opcode_is_a_nop() {
    let (mut cpu, mut bus) = machine(&[0xED, 0x00, 0xED, 0xFF]);
    let before = cpu.state();
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.step(&mut bus), 8);

    let after = cpu.state();
    assert_eq!(after.pc, 4);
    assert_eq!(after.r, 4);
    assert_eq!(CpuState { pc: 0, r: 0, ..after }, CpuState { pc: 0, r: 0, ..before });
}

#[test]
fn ld_a_r_reports_iff2() {
    // LD A,R
    let (mut cpu, mut bus) = machine(&[0xED, 0x5F]);
    cpu.registers_mut().iff2 = true;
    cpu.registers_mut().r = 0x7E;
    cpu.step(&mut bus);
    // R advanced by the two fetches before being read
    assert_eq!(cpu.registers().a, 0x00);
    assert_ne!(cpu.registers().f & PF, 0);
}

#[test]
fn r_keeps_bit_seven() {
    let (mut cpu, mut bus) = machine(&[0x00; 4]);
    cpu.registers_mut().r = 0xFF;
    cpu.step(&mut bus);
    assert_eq!(cpu.registers().r, 0x80);
}
