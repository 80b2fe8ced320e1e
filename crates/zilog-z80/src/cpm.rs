//! Minimal CP/M environment for running instruction exercisers.
//!
//! Memory layout:
//! - 0x0000: warm boot. A HALT ends the run.
//! - 0x0005: BDOS entry, `JP 0xFE00`. Programs read the jump target at
//!   0x0006 as the top of the TPA and put their stack below it.
//! - 0xFE00: `OUT (5),A; RET`. The port write is the BDOS trap.
//! - 0x0100: program load address (TPA start).
//!
//! Only BDOS console output is supported: function 2 (character in E) and
//! function 9 (`$`-terminated string at DE).

use std::fmt;

use emu_core::{Bus, Cpu, IoBus, Peek, SimpleBus, TStates};

use crate::Z80;

/// Where programs are loaded and started.
pub const TPA_START: u16 = 0x0100;
/// Top of the TPA and address of the BDOS trap routine.
pub const BDOS_ADDRESS: u16 = 0xFE00;
/// Port whose writes trap into the BDOS emulation.
pub const BDOS_PORT: u8 = 0x05;

/// T-states per run slice. Traps end a slice early.
const SLICE: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpmError {
    /// The program does not fit between the TPA start and the BDOS.
    ProgramTooLarge { size: usize, max: usize },
    Empty,
}

impl fmt::Display for CpmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgramTooLarge { size, max } => {
                write!(f, "program is {size} bytes, TPA holds {max}")
            }
            Self::Empty => write!(f, "program is empty"),
        }
    }
}

impl std::error::Error for CpmError {}

/// 64K RAM with the BDOS port trap.
pub struct CpmBus {
    memory: SimpleBus,
    bdos_call: bool,
}

impl CpmBus {
    pub fn new(program: &[u8]) -> Result<Self, CpmError> {
        let max = usize::from(BDOS_ADDRESS - TPA_START);
        if program.is_empty() {
            return Err(CpmError::Empty);
        }
        if program.len() > max {
            return Err(CpmError::ProgramTooLarge {
                size: program.len(),
                max,
            });
        }

        let mut memory = SimpleBus::new();
        let [lo, hi] = BDOS_ADDRESS.to_le_bytes();
        memory.load(0x0000, &[0x76]);
        memory.load(0x0005, &[0xC3, lo, hi]);
        memory.load(BDOS_ADDRESS, &[0xD3, BDOS_PORT, 0xC9]);
        memory.load(TPA_START, program);
        Ok(Self {
            memory,
            bdos_call: false,
        })
    }

    /// Consume the pending BDOS trap, if any.
    pub fn take_bdos_call(&mut self) -> bool {
        std::mem::take(&mut self.bdos_call)
    }

    #[must_use]
    pub fn memory(&self) -> &SimpleBus {
        &self.memory
    }
}

impl Peek for CpmBus {
    fn peek(&self, address: u16) -> u8 {
        self.memory.peek(address)
    }
}

impl Bus for CpmBus {
    fn read(&mut self, address: u16, clock: &mut TStates) -> u8 {
        self.memory.read(address, clock)
    }

    fn write(&mut self, address: u16, value: u8, clock: &mut TStates) {
        self.memory.write(address, value, clock);
    }
}

impl IoBus for CpmBus {
    fn read_port(&mut self, _high: u8, _low: u8, _clock: &mut TStates) -> u8 {
        0xFF
    }

    fn write_port(&mut self, _high: u8, low: u8, _value: u8, clock: &mut TStates) {
        if low == BDOS_PORT {
            self.bdos_call = true;
            clock.request_yield();
        }
    }
}

/// A CPU and a [`CpmBus`] running one program.
pub struct CpmMachine {
    cpu: Z80,
    bus: CpmBus,
}

impl CpmMachine {
    pub fn new(program: &[u8]) -> Result<Self, CpmError> {
        let bus = CpmBus::new(program)?;
        let mut cpu = Z80::new();
        cpu.registers_mut().pc = TPA_START;
        Ok(Self { cpu, bus })
    }

    /// True once the program has warm-booted.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Lifetime T-states.
    #[must_use]
    pub fn t_states(&self) -> u64 {
        self.cpu.clock().total()
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    /// Run one slice, passing console output to `output`.
    pub fn run_slice(&mut self, mut output: impl FnMut(char)) {
        self.cpu.run(&mut self.bus, SLICE);
        if self.bus.take_bdos_call() {
            self.bdos(&mut output);
        }
    }

    fn bdos(&self, output: &mut impl FnMut(char)) {
        let regs = self.cpu.registers();
        match regs.c {
            2 => output(char::from(regs.e)),
            9 => {
                let mut address = regs.de();
                // bounded so a missing terminator cannot spin forever
                for _ in 0..0x10000 {
                    let byte = self.bus.peek(address);
                    if byte == b'$' {
                        break;
                    }
                    output(char::from(byte));
                    address = address.wrapping_add(1);
                }
            }
            function => log::debug!("unsupported BDOS function {function}"),
        }
    }
}

/// Outcome of [`run_program`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpmRun {
    /// Everything printed through the BDOS.
    pub output: String,
    pub t_states: u64,
    /// False if the T-state limit was reached before warm boot.
    pub completed: bool,
}

impl CpmRun {
    /// Completed without any exerciser reporting an error.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.completed && !self.output.contains("ERROR")
    }
}

/// Run `program` until warm boot or until `max_t_states` have elapsed.
pub fn run_program(program: &[u8], max_t_states: u64) -> Result<CpmRun, CpmError> {
    let mut machine = CpmMachine::new(program)?;
    let mut output = String::new();
    while !machine.finished() && machine.t_states() < max_t_states {
        machine.run_slice(|ch| output.push(ch));
    }
    Ok(CpmRun {
        output,
        t_states: machine.t_states(),
        completed: machine.finished(),
    })
}

/// Preliminary self-test, loaded at 0x0100.
///
/// A linear sequence of checks over the basic instruction groups. Each
/// check stores its letter at 0x8020 and jumps to the error routine on a
/// mismatch, which prints `ERROR in test X`. Success prints
/// `Preliminary tests complete`.
pub static PRELIM: &[u8] = &[
    0xC3, 0x46, 0x01,                // 0100 JP START
    0x11, 0x1A, 0x01,                // 0103 ERR: LD DE,MSG_ERR
    0x0E, 0x09,                      // 0106 LD C,9
    0xCD, 0x05, 0x00,                // 0108 CALL BDOS
    0x3A, 0x20, 0x80,                // 010B LD A,(CNT)
    0x5F,                            // 010E LD E,A
    0x0E, 0x02,                      // 010F LD C,2
    0xCD, 0x05, 0x00,                // 0111 CALL BDOS
    0xC3, 0x00, 0x00,                // 0114 JP 0
    0x3E, 0x42,                      // 0117 SUB1: LD A,42h
    0xC9,                            // 0119 RET
    // 011A MSG_ERR: "ERROR in test $"
    0x45, 0x52, 0x52, 0x4F, 0x52, 0x20, 0x69, 0x6E, 0x20, 0x74, 0x65, 0x73,
    0x74, 0x20, 0x24,
    // 0129 MSG_OK: "Preliminary tests complete\r\n$"
    0x50, 0x72, 0x65, 0x6C, 0x69, 0x6D, 0x69, 0x6E, 0x61, 0x72, 0x79, 0x20,
    0x74, 0x65, 0x73, 0x74, 0x73, 0x20, 0x63, 0x6F, 0x6D, 0x70, 0x6C, 0x65,
    0x74, 0x65, 0x0D, 0x0A, 0x24,
    0x2A, 0x06, 0x00,                // 0146 START: LD HL,(0006h)
    0xF9,                            // 0149 LD SP,HL
    0x3E, 0x41, 0x32, 0x20, 0x80,    // 014A test A: CP
    0x3E, 0x5A,                      // 014F LD A,5Ah
    0xFE, 0x5A,                      // 0151 CP 5Ah
    0xC2, 0x03, 0x01,                // 0153 JP NZ,ERR
    0xFE, 0x5B,                      // 0156 CP 5Bh
    0xCA, 0x03, 0x01,                // 0158 JP Z,ERR
    0xD2, 0x03, 0x01,                // 015B JP NC,ERR
    0x3E, 0x42, 0x32, 0x20, 0x80,    // 015E test B: PUSH/POP AF
    0x21, 0x34, 0x12,                // 0163 LD HL,1234h
    0xE5,                            // 0166 PUSH HL
    0xF1,                            // 0167 POP AF
    0xF5,                            // 0168 PUSH AF
    0xD1,                            // 0169 POP DE
    0x7A,                            // 016A LD A,D
    0xFE, 0x12,                      // 016B CP 12h
    0xC2, 0x03, 0x01,                // 016D JP NZ,ERR
    0x7B,                            // 0170 LD A,E
    0xFE, 0x34,                      // 0171 CP 34h
    0xC2, 0x03, 0x01,                // 0173 JP NZ,ERR
    0x3E, 0x43, 0x32, 0x20, 0x80,    // 0176 test C: XOR
    0xAF,                            // 017B XOR A
    0xC2, 0x03, 0x01,                // 017C JP NZ,ERR
    0xDA, 0x03, 0x01,                // 017F JP C,ERR
    0xE2, 0x03, 0x01,                // 0182 JP PO,ERR
    0x3E, 0x44, 0x32, 0x20, 0x80,    // 0185 test D: ADD overflow
    0x3E, 0x7F,                      // 018A LD A,7Fh
    0xC6, 0x01,                      // 018C ADD A,1
    0xF2, 0x03, 0x01,                // 018E JP P,ERR
    0xE2, 0x03, 0x01,                // 0191 JP PO,ERR
    0xDA, 0x03, 0x01,                // 0194 JP C,ERR
    0xFE, 0x80,                      // 0197 CP 80h
    0xC2, 0x03, 0x01,                // 0199 JP NZ,ERR
    0x3E, 0x45, 0x32, 0x20, 0x80,    // 019C test E: ADD carry
    0x3E, 0xFF,                      // 01A1 LD A,FFh
    0xC6, 0x01,                      // 01A3 ADD A,1
    0xC2, 0x03, 0x01,                // 01A5 JP NZ,ERR
    0xD2, 0x03, 0x01,                // 01A8 JP NC,ERR
    0x3E, 0x46, 0x32, 0x20, 0x80,    // 01AB test F: SUB
    0x3E, 0x10,                      // 01B0 LD A,10h
    0xD6, 0x20,                      // 01B2 SUB 20h
    0xD2, 0x03, 0x01,                // 01B4 JP NC,ERR
    0xF2, 0x03, 0x01,                // 01B7 JP P,ERR
    0xFE, 0xF0,                      // 01BA CP F0h
    0xC2, 0x03, 0x01,                // 01BC JP NZ,ERR
    0x3E, 0x47, 0x32, 0x20, 0x80,    // 01BF test G: ADC/SBC
    0x37,                            // 01C4 SCF
    0x3E, 0x10,                      // 01C5 LD A,10h
    0xCE, 0x05,                      // 01C7 ADC A,5
    0xFE, 0x16,                      // 01C9 CP 16h
    0xC2, 0x03, 0x01,                // 01CB JP NZ,ERR
    0x37,                            // 01CE SCF
    0x3E, 0x10,                      // 01CF LD A,10h
    0xDE, 0x05,                      // 01D1 SBC A,5
    0xFE, 0x0A,                      // 01D3 CP 0Ah
    0xC2, 0x03, 0x01,                // 01D5 JP NZ,ERR
    0x3E, 0x48, 0x32, 0x20, 0x80,    // 01D8 test H: INC/DEC
    0x37,                            // 01DD SCF
    0x06, 0xFF,                      // 01DE LD B,FFh
    0x04,                            // 01E0 INC B
    0xC2, 0x03, 0x01,                // 01E1 JP NZ,ERR
    0xD2, 0x03, 0x01,                // 01E4 JP NC,ERR
    0x05,                            // 01E7 DEC B
    0xCA, 0x03, 0x01,                // 01E8 JP Z,ERR
    0x78,                            // 01EB LD A,B
    0xFE, 0xFF,                      // 01EC CP FFh
    0xC2, 0x03, 0x01,                // 01EE JP NZ,ERR
    0x3E, 0x49, 0x32, 0x20, 0x80,    // 01F1 test I: AND/OR
    0x3E, 0xF0,                      // 01F6 LD A,F0h
    0xE6, 0x3C,                      // 01F8 AND 3Ch
    0xFE, 0x30,                      // 01FA CP 30h
    0xC2, 0x03, 0x01,                // 01FC JP NZ,ERR
    0xF6, 0x0F,                      // 01FF OR 0Fh
    0xFE, 0x3F,                      // 0201 CP 3Fh
    0xC2, 0x03, 0x01,                // 0203 JP NZ,ERR
    0x3E, 0x4A, 0x32, 0x20, 0x80,    // 0206 test J: RLCA/RRA
    0x3E, 0x81,                      // 020B LD A,81h
    0x07,                            // 020D RLCA
    0xD2, 0x03, 0x01,                // 020E JP NC,ERR
    0xFE, 0x03,                      // 0211 CP 03h
    0xC2, 0x03, 0x01,                // 0213 JP NZ,ERR
    0x1F,                            // 0216 RRA
    0xD2, 0x03, 0x01,                // 0217 JP NC,ERR
    0xFE, 0x01,                      // 021A CP 01h
    0xC2, 0x03, 0x01,                // 021C JP NZ,ERR
    0x3E, 0x4B, 0x32, 0x20, 0x80,    // 021F test K: CB shifts
    0x06, 0x80,                      // 0224 LD B,80h
    0xCB, 0x38,                      // 0226 SRL B
    0xCB, 0x20,                      // 0228 SLA B
    0xCB, 0x28,                      // 022A SRA B
    0x78,                            // 022C LD A,B
    0xFE, 0xC0,                      // 022D CP C0h
    0xC2, 0x03, 0x01,                // 022F JP NZ,ERR
    0x3E, 0x4C, 0x32, 0x20, 0x80,    // 0232 test L: BIT/SET/RES
    0x0E, 0x00,                      // 0237 LD C,0
    0xCB, 0xD9,                      // 0239 SET 3,C
    0xCB, 0x59,                      // 023B BIT 3,C
    0xCA, 0x03, 0x01,                // 023D JP Z,ERR
    0xCB, 0x99,                      // 0240 RES 3,C
    0xCB, 0x59,                      // 0242 BIT 3,C
    0xC2, 0x03, 0x01,                // 0244 JP NZ,ERR
    0x79,                            // 0247 LD A,C
    0xB7,                            // 0248 OR A
    0xC2, 0x03, 0x01,                // 0249 JP NZ,ERR
    0x3E, 0x4D, 0x32, 0x20, 0x80,    // 024C test M: 16-bit INC/ADD
    0x21, 0xFF, 0x7F,                // 0251 LD HL,7FFFh
    0x23,                            // 0254 INC HL
    0x7C,                            // 0255 LD A,H
    0xFE, 0x80,                      // 0256 CP 80h
    0xC2, 0x03, 0x01,                // 0258 JP NZ,ERR
    0x21, 0x00, 0x10,                // 025B LD HL,1000h
    0x11, 0x34, 0x02,                // 025E LD DE,0234h
    0x19,                            // 0261 ADD HL,DE
    0x7D,                            // 0262 LD A,L
    0xFE, 0x34,                      // 0263 CP 34h
    0xC2, 0x03, 0x01,                // 0265 JP NZ,ERR
    0x7C,                            // 0268 LD A,H
    0xFE, 0x12,                      // 0269 CP 12h
    0xC2, 0x03, 0x01,                // 026B JP NZ,ERR
    0x3E, 0x4E, 0x32, 0x20, 0x80,    // 026E test N: SBC HL
    0xB7,                            // 0273 OR A
    0x21, 0x34, 0x12,                // 0274 LD HL,1234h
    0x01, 0x34, 0x12,                // 0277 LD BC,1234h
    0xED, 0x42,                      // 027A SBC HL,BC
    0xC2, 0x03, 0x01,                // 027C JP NZ,ERR
    0x3E, 0x4F, 0x32, 0x20, 0x80,    // 027F test O: ADC HL
    0x37,                            // 0284 SCF
    0x21, 0xFF, 0xFF,                // 0285 LD HL,FFFFh
    0x11, 0x00, 0x00,                // 0288 LD DE,0
    0xED, 0x5A,                      // 028B ADC HL,DE
    0xC2, 0x03, 0x01,                // 028D JP NZ,ERR
    0xD2, 0x03, 0x01,                // 0290 JP NC,ERR
    0x3E, 0x50, 0x32, 0x20, 0x80,    // 0293 test P: memory loads
    0x21, 0x00, 0x80,                // 0298 LD HL,BUF
    0x36, 0xA5,                      // 029B LD (HL),A5h
    0x7E,                            // 029D LD A,(HL)
    0xFE, 0xA5,                      // 029E CP A5h
    0xC2, 0x03, 0x01,                // 02A0 JP NZ,ERR
    0x11, 0xAA, 0x55,                // 02A3 LD DE,55AAh
    0xED, 0x53, 0x00, 0x80,          // 02A6 LD (BUF),DE
    0x2A, 0x00, 0x80,                // 02AA LD HL,(BUF)
    0x7C,                            // 02AD LD A,H
    0xFE, 0x55,                      // 02AE CP 55h
    0xC2, 0x03, 0x01,                // 02B0 JP NZ,ERR
    0x7D,                            // 02B3 LD A,L
    0xFE, 0xAA,                      // 02B4 CP AAh
    0xC2, 0x03, 0x01,                // 02B6 JP NZ,ERR
    0x3E, 0x51, 0x32, 0x20, 0x80,    // 02B9 test Q: CALL/RET
    0xAF,                            // 02BE XOR A
    0xCD, 0x17, 0x01,                // 02BF CALL SUB1
    0xFE, 0x42,                      // 02C2 CP 42h
    0xC2, 0x03, 0x01,                // 02C4 JP NZ,ERR
    0xAF,                            // 02C7 XOR A
    0xC4, 0x03, 0x01,                // 02C8 CALL NZ,ERR
    0xCC, 0x17, 0x01,                // 02CB CALL Z,SUB1
    0xFE, 0x42,                      // 02CE CP 42h
    0xC2, 0x03, 0x01,                // 02D0 JP NZ,ERR
    0x3E, 0x52, 0x32, 0x20, 0x80,    // 02D3 test R: DJNZ
    0x06, 0x05,                      // 02D8 LD B,5
    0xAF,                            // 02DA XOR A
    0x3C,                            // 02DB loop: INC A
    0x10, 0xFD,                      // 02DC DJNZ loop
    0xFE, 0x05,                      // 02DE CP 05h
    0xC2, 0x03, 0x01,                // 02E0 JP NZ,ERR
    0x3E, 0x53, 0x32, 0x20, 0x80,    // 02E3 test S: JR
    0x18, 0x03,                      // 02E8 JR +3
    0xC3, 0x03, 0x01,                // 02EA JP ERR
    0xAF,                            // 02ED XOR A
    0x28, 0x03,                      // 02EE JR Z,+3
    0xC3, 0x03, 0x01,                // 02F0 JP ERR
    0x20, 0x00,                      // 02F3 JR NZ,+0
    0x3E, 0x54, 0x32, 0x20, 0x80,    // 02F5 test T: EX/EXX
    0x01, 0x11, 0x11,                // 02FA LD BC,1111h
    0xD9,                            // 02FD EXX
    0x01, 0x22, 0x22,                // 02FE LD BC,2222h
    0xD9,                            // 0301 EXX
    0x78,                            // 0302 LD A,B
    0xFE, 0x11,                      // 0303 CP 11h
    0xC2, 0x03, 0x01,                // 0305 JP NZ,ERR
    0x11, 0x44, 0x33,                // 0308 LD DE,3344h
    0x21, 0x00, 0x00,                // 030B LD HL,0
    0xEB,                            // 030E EX DE,HL
    0x7C,                            // 030F LD A,H
    0xFE, 0x33,                      // 0310 CP 33h
    0xC2, 0x03, 0x01,                // 0312 JP NZ,ERR
    0x3E, 0x77,                      // 0315 LD A,77h
    0x08,                            // 0317 EX AF,AF'
    0x3E, 0x00,                      // 0318 LD A,0
    0x08,                            // 031A EX AF,AF'
    0xFE, 0x77,                      // 031B CP 77h
    0xC2, 0x03, 0x01,                // 031D JP NZ,ERR
    0x3E, 0x55, 0x32, 0x20, 0x80,    // 0320 test U: IX/IY
    0xDD, 0x21, 0x00, 0x80,          // 0325 LD IX,BUF
    0xDD, 0x36, 0x02, 0x99,          // 0329 LD (IX+2),99h
    0xDD, 0x7E, 0x02,                // 032D LD A,(IX+2)
    0xFE, 0x99,                      // 0330 CP 99h
    0xC2, 0x03, 0x01,                // 0332 JP NZ,ERR
    0xFD, 0x21, 0x04, 0x80,          // 0335 LD IY,BUF+4
    0xFD, 0x36, 0xFF, 0x66,          // 0339 LD (IY-1),66h
    0x3A, 0x03, 0x80,                // 033D LD A,(BUF+3)
    0xFE, 0x66,                      // 0340 CP 66h
    0xC2, 0x03, 0x01,                // 0342 JP NZ,ERR
    0xDD, 0x34, 0x02,                // 0345 INC (IX+2)
    0xDD, 0x7E, 0x02,                // 0348 LD A,(IX+2)
    0xFE, 0x9A,                      // 034B CP 9Ah
    0xC2, 0x03, 0x01,                // 034D JP NZ,ERR
    0x3E, 0x56, 0x32, 0x20, 0x80,    // 0350 test V: LDIR
    0x21, 0x29, 0x01,                // 0355 LD HL,MSG_OK
    0x11, 0x10, 0x80,                // 0358 LD DE,BUF2
    0x01, 0x04, 0x00,                // 035B LD BC,4
    0xED, 0xB0,                      // 035E LDIR
    0x78,                            // 0360 LD A,B
    0xB1,                            // 0361 OR C
    0xC2, 0x03, 0x01,                // 0362 JP NZ,ERR
    0x3A, 0x13, 0x80,                // 0365 LD A,(BUF2+3)
    0xFE, 0x6C,                      // 0368 CP 6Ch
    0xC2, 0x03, 0x01,                // 036A JP NZ,ERR
    0x7B,                            // 036D LD A,E
    0xFE, 0x14,                      // 036E CP 14h
    0xC2, 0x03, 0x01,                // 0370 JP NZ,ERR
    0x3E, 0x57, 0x32, 0x20, 0x80,    // 0373 test W: CPIR
    0x21, 0x29, 0x01,                // 0378 LD HL,MSG_OK
    0x01, 0x20, 0x00,                // 037B LD BC,20h
    0x3E, 0x79,                      // 037E LD A,'y'
    0xED, 0xB1,                      // 0380 CPIR
    0xC2, 0x03, 0x01,                // 0382 JP NZ,ERR
    0x7D,                            // 0385 LD A,L
    0xFE, 0x34,                      // 0386 CP 34h
    0xC2, 0x03, 0x01,                // 0388 JP NZ,ERR
    0x3E, 0x58, 0x32, 0x20, 0x80,    // 038B test X: DAA
    0x3E, 0x15,                      // 0390 LD A,15h
    0xC6, 0x27,                      // 0392 ADD A,27h
    0x27,                            // 0394 DAA
    0xFE, 0x42,                      // 0395 CP 42h
    0xC2, 0x03, 0x01,                // 0397 JP NZ,ERR
    0xD6, 0x15,                      // 039A SUB 15h
    0x27,                            // 039C DAA
    0xFE, 0x27,                      // 039D CP 27h
    0xC2, 0x03, 0x01,                // 039F JP NZ,ERR
    0x3E, 0x59, 0x32, 0x20, 0x80,    // 03A2 test Y: NEG
    0x3E, 0x01,                      // 03A7 LD A,1
    0xED, 0x44,                      // 03A9 NEG
    0xD2, 0x03, 0x01,                // 03AB JP NC,ERR
    0xFE, 0xFF,                      // 03AE CP FFh
    0xC2, 0x03, 0x01,                // 03B0 JP NZ,ERR
    0x3E, 0x5A, 0x32, 0x20, 0x80,    // 03B3 test Z: RLD
    0x21, 0x00, 0x80,                // 03B8 LD HL,BUF
    0x36, 0x34,                      // 03BB LD (HL),34h
    0x3E, 0x12,                      // 03BD LD A,12h
    0xED, 0x6F,                      // 03BF RLD
    0xFE, 0x13,                      // 03C1 CP 13h
    0xC2, 0x03, 0x01,                // 03C3 JP NZ,ERR
    0x7E,                            // 03C6 LD A,(HL)
    0xFE, 0x42,                      // 03C7 CP 42h
    0xC2, 0x03, 0x01,                // 03C9 JP NZ,ERR
    0x3E, 0x5B, 0x32, 0x20, 0x80,    // 03CC test [: LD A,I
    0x3E, 0x3F,                      // 03D1 LD A,3Fh
    0xED, 0x47,                      // 03D3 LD I,A
    0x3E, 0x00,                      // 03D5 LD A,0
    0xED, 0x57,                      // 03D7 LD A,I
    0xFE, 0x3F,                      // 03D9 CP 3Fh
    0xC2, 0x03, 0x01,                // 03DB JP NZ,ERR
    0x3E, 0x5C, 0x32, 0x20, 0x80,    // 03DE test \: IN r,(C)
    0x01, 0x10, 0x00,                // 03E3 LD BC,0010h
    0xED, 0x58,                      // 03E6 IN E,(C)
    0x7B,                            // 03E8 LD A,E
    0xFE, 0xFF,                      // 03E9 CP FFh
    0xC2, 0x03, 0x01,                // 03EB JP NZ,ERR
    0x3E, 0x5D, 0x32, 0x20, 0x80,    // 03EE test ]: PUSH/POP IX
    0xDD, 0x21, 0xEF, 0xBE,          // 03F3 LD IX,BEEFh
    0xDD, 0xE5,                      // 03F7 PUSH IX
    0xC1,                            // 03F9 POP BC
    0x78,                            // 03FA LD A,B
    0xFE, 0xBE,                      // 03FB CP BEh
    0xC2, 0x03, 0x01,                // 03FD JP NZ,ERR
    0xDD, 0x7D,                      // 0400 LD A,IXL
    0xFE, 0xEF,                      // 0402 CP EFh
    0xC2, 0x03, 0x01,                // 0404 JP NZ,ERR
    0x3E, 0x5E, 0x32, 0x20, 0x80,    // 0407 test ^: SCF/CCF
    0x37,                            // 040C SCF
    0x3F,                            // 040D CCF
    0xDA, 0x03, 0x01,                // 040E JP C,ERR
    0x11, 0x29, 0x01,                // 0411 LD DE,MSG_OK
    0x0E, 0x09,                      // 0414 LD C,9
    0xCD, 0x05, 0x00,                // 0416 CALL BDOS
    0xC3, 0x00, 0x00,                // 0419 JP 0
];
