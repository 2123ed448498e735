//! A small machine that runs generated assembly, so the tests can check what
//! the code does rather than only how it reads.
use crate::assembly::{Address, Assembly, Comp, Dest, Instruction, Jump, Symbol};
use crate::output::AssemblyOutput;
use std::collections::HashMap;

const RAM_SIZE: usize = 1 << 16;
/// First cell handed to symbols that aren't labels
const FIRST_VARIABLE: u16 = 16;

#[derive(Debug, Clone, Copy)]
enum Op {
    Load(i16),
    Compute { dest: Dest, comp: Comp, jump: Jump },
}

pub struct Emulator {
    rom: Vec<Op>,
    labels: HashMap<String, usize>,
    variables: HashMap<String, u16>,
    ram: Vec<i16>,
    a: i16,
    d: i16,
    pc: usize,
}

impl Emulator {
    pub fn new(program: &AssemblyOutput) -> Self {
        let mut labels = HashMap::new();
        let mut instructions = Vec::new();
        for asm in program.iter() {
            match asm {
                Assembly::Label(symbol) => {
                    let previous = labels.insert(symbol.to_string(), instructions.len());
                    assert!(previous.is_none(), "label {symbol} defined twice");
                }
                Assembly::Instruction(instruction) => instructions.push(instruction),
                Assembly::Comment(_) => {}
            }
        }

        let mut variables = HashMap::new();
        let rom = instructions
            .into_iter()
            .map(|instruction| match instruction {
                Instruction::Address(Address::Constant(value)) => Op::Load(*value as i16),
                Instruction::Address(Address::Symbol(Symbol::Register(register))) => {
                    Op::Load(register.address() as i16)
                }
                Instruction::Address(Address::Symbol(symbol)) => {
                    let name = symbol.to_string();
                    let value = match labels.get(&name) {
                        Some(&target) => target as u16,
                        None => {
                            let next = FIRST_VARIABLE + variables.len() as u16;
                            *variables.entry(name).or_insert(next)
                        }
                    };
                    Op::Load(value as i16)
                }
                Instruction::Compute { dest, comp, jump } => Op::Compute {
                    dest: *dest,
                    comp: *comp,
                    jump: *jump,
                },
            })
            .collect();

        Self {
            rom,
            labels,
            variables,
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
        }
    }

    pub fn set_stack(&mut self, sp: i16) {
        self.set_ram(0, sp);
    }

    pub fn set_ram(&mut self, address: u16, value: i16) {
        self.ram[address as usize] = value;
    }

    pub fn ram(&self, address: u16) -> i16 {
        self.ram[address as usize]
    }

    pub fn sp(&self) -> i16 {
        self.ram(0)
    }

    pub fn stack_top(&self) -> i16 {
        self.ram(self.sp() as u16 - 1)
    }

    /// Cell allocated to a non-label symbol such as `Main.0`
    pub fn variable(&self, name: &str) -> u16 {
        self.variables[name]
    }

    /// Runs until execution falls off the end of the program
    pub fn run(&mut self, max_steps: usize) {
        for _ in 0..max_steps {
            if self.pc >= self.rom.len() {
                return;
            }
            self.step();
        }
        panic!("program still running after {max_steps} steps");
    }

    /// Runs until the instruction following `label` is about to execute
    pub fn run_until(&mut self, label: &str, max_steps: usize) {
        let target = self.labels[label];
        for _ in 0..max_steps {
            if self.pc == target {
                return;
            }
            assert!(self.pc < self.rom.len(), "fell off the program before {label}");
            self.step();
        }
        panic!("{label} not reached after {max_steps} steps");
    }

    fn step(&mut self) {
        match self.rom[self.pc] {
            Op::Load(value) => {
                self.a = value;
                self.pc += 1;
            }
            Op::Compute { dest, comp, jump } => {
                let address = self.a;
                let value = self.eval(comp);
                if dest.writes_m() {
                    self.ram[address as u16 as usize] = value;
                }
                if dest.writes_a() {
                    self.a = value;
                }
                if dest.writes_d() {
                    self.d = value;
                }
                self.pc = if jumps(jump, value) {
                    address as u16 as usize
                } else {
                    self.pc + 1
                };
            }
        }
    }

    fn eval(&self, comp: Comp) -> i16 {
        let (a, d) = (self.a, self.d);
        let m = self.ram[a as u16 as usize];
        match comp {
            Comp::Zero => 0,
            Comp::One => 1,
            Comp::MinusOne => -1,
            Comp::D => d,
            Comp::A => a,
            Comp::M => m,
            Comp::NotD => !d,
            Comp::NotA => !a,
            Comp::NotM => !m,
            Comp::NegD => d.wrapping_neg(),
            Comp::NegA => a.wrapping_neg(),
            Comp::NegM => m.wrapping_neg(),
            Comp::DPlusOne => d.wrapping_add(1),
            Comp::APlusOne => a.wrapping_add(1),
            Comp::MPlusOne => m.wrapping_add(1),
            Comp::DMinusOne => d.wrapping_sub(1),
            Comp::AMinusOne => a.wrapping_sub(1),
            Comp::MMinusOne => m.wrapping_sub(1),
            Comp::DPlusA => d.wrapping_add(a),
            Comp::DPlusM => d.wrapping_add(m),
            Comp::DMinusA => d.wrapping_sub(a),
            Comp::DMinusM => d.wrapping_sub(m),
            Comp::AMinusD => a.wrapping_sub(d),
            Comp::MMinusD => m.wrapping_sub(d),
            Comp::DAndA => d & a,
            Comp::DAndM => d & m,
            Comp::DOrA => d | a,
            Comp::DOrM => d | m,
        }
    }
}

fn jumps(jump: Jump, value: i16) -> bool {
    match jump {
        Jump::Never => false,
        Jump::GreaterThan => value > 0,
        Jump::Equals => value == 0,
        Jump::GreaterEqual => value >= 0,
        Jump::LessThan => value < 0,
        Jump::NotEquals => value != 0,
        Jump::LessEqual => value <= 0,
        Jump::Always => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::Register;

    #[test]
    fn labels_resolve_and_variables_are_allocated() {
        let mut program = AssemblyOutput::new();
        program
            .at(Symbol::Static {
                namespace: "Main".into(),
                index: 0,
            })
            .assign(Dest::M, Comp::MinusOne)
            .at(Symbol::Function("end".into()))
            .jump(Comp::Zero, Jump::Always)
            .at(Register::StackPointer)
            .assign(Dest::M, Comp::One)
            .label(Symbol::Function("end".into()));

        let mut emulator = Emulator::new(&program);
        emulator.run(100);
        assert_eq!(emulator.variable("Main.0"), 16);
        assert_eq!(emulator.ram(16), -1);
        assert_eq!(emulator.sp(), 0);
    }
}
