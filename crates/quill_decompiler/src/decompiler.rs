use std::fmt;
use std::fmt::Write;
use std::rc::Rc;

use quill_middle::compiler::constant::{Constant, Function};
use quill_middle::compiler::instruction::{AssignKind, Instruction};
use quill_middle::compiler::{FunctionCallMetadata, ObjectMemberKind};
use quill_middle::interner::{StringInterner, Symbol};
use quill_middle::util::{Reader, format_f64};

use crate::DecompileError;

pub struct FunctionDecompiler<'interner, 'buf> {
    interner: &'interner StringInterner,
    reader: Reader<&'buf [u8]>,
    constants: &'buf [Constant],
    name: &'buf str,
    out: String,
    /// Index of the current instruction in the bytecode
    instr_idx: usize,
}

impl<'interner, 'buf> FunctionDecompiler<'interner, 'buf> {
    pub fn new(interner: &'interner StringInterner, buf: &'buf [u8], constants: &'buf [Constant], name: &'buf str) -> Self {
        Self {
            reader: Reader::new(buf),
            constants,
            interner,
            out: format!("function {name}:\n"),
            name,
            instr_idx: 0,
        }
    }

    fn handle_opless_instr(&mut self, name: &str) {
        let _ = writeln!(self.out, "{:02x}  {}", self.instr_idx, name);
    }

    fn handle_op_instr(&mut self, name: &str, args: &[&dyn fmt::Display]) {
        let _ = write!(self.out, "{:02x}  {}  ", self.instr_idx, name);
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                let _ = write!(self.out, ", ");
            }

            let _ = write!(self.out, "{arg}");
        }
        let _ = self.out.write_char('\n');
    }

    fn handle_op_map_instr(&mut self, name: &str, args: &[(&str, &dyn fmt::Display)]) {
        let _ = write!(self.out, "{:02x}  {}  ", self.instr_idx, name);
        for (index, (key, arg)) in args.iter().enumerate() {
            if index > 0 {
                let _ = write!(self.out, ", ");
            }

            let _ = write!(self.out, "{key}: {arg}");
        }
        let _ = self.out.write_char('\n');
    }

    /// Handles an opcode with a single wide argument that is in the following bytecode.
    fn handle_incw_op_instr(&mut self, name: &str) -> Result<(), DecompileError> {
        let b = self.read_u16()?;
        self.handle_op_instr(name, &[&b]);
        Ok(())
    }

    /// Handles an opcode whose operand is an identifier constant
    fn handle_ident_instr(&mut self, name: &str, instr: Instruction) -> Result<(), DecompileError> {
        let ident = self.read_ident(instr)?;
        self.handle_op_instr(name, &[&ident]);
        Ok(())
    }

    fn read(&mut self) -> Result<u8, DecompileError> {
        self.reader.read().ok_or(DecompileError::AbruptEof)
    }

    fn read_u16(&mut self) -> Result<u16, DecompileError> {
        self.reader.read_u16_le().ok_or(DecompileError::AbruptEof)
    }

    fn read_i16(&mut self) -> Result<i16, DecompileError> {
        self.reader.read_i16_le().ok_or(DecompileError::AbruptEof)
    }

    fn read_assign_kind(&mut self) -> Result<AssignKind, DecompileError> {
        let b = self.read()?;
        AssignKind::from_repr(b).ok_or(DecompileError::InvalidAssignKind(b))
    }

    fn constant(&self, id: u16) -> Result<&'buf Constant, DecompileError> {
        self.constants
            .get(usize::from(id))
            .ok_or(DecompileError::InvalidConstant(id))
    }

    fn read_ident(&mut self, instr: Instruction) -> Result<&'interner str, DecompileError> {
        let id = self.read_u16()?;
        let sym = self
            .constant(id)?
            .as_identifier()
            .ok_or(DecompileError::ExpectedIdentifier(instr))?;
        Ok(self.interner.resolve(sym))
    }

    fn function_name(&self, name: Option<Symbol>) -> &'interner str {
        name.map_or("<anon>", |name| self.interner.resolve(name))
    }

    fn display_constant(&self, constant: &Constant) -> String {
        match constant {
            Constant::Number(n) => format_f64(*n),
            Constant::String(s) => format!("{:?}", self.interner.resolve(*s)),
            Constant::Identifier(s) => self.interner.resolve(*s).to_owned(),
            Constant::Boolean(b) => b.to_string(),
            Constant::Function(fun) => format!("function {}", self.function_name(fun.name)),
            Constant::Null => String::from("null"),
            Constant::Undefined => String::from("undefined"),
        }
    }

    pub fn run(mut self) -> Result<String, DecompileError> {
        let mut functions: Vec<Rc<Function>> = Vec::new();

        loop {
            self.instr_idx = self.reader.offset();
            let instr = match self.read() {
                Ok(i) => Instruction::from_repr(i).ok_or(DecompileError::InvalidOp(i))?,
                Err(..) => break,
            };

            match instr {
                Instruction::Add => self.handle_opless_instr("add"),
                Instruction::Sub => self.handle_opless_instr("sub"),
                Instruction::Mul => self.handle_opless_instr("mul"),
                Instruction::Div => self.handle_opless_instr("div"),
                Instruction::Rem => self.handle_opless_instr("rem"),
                Instruction::Pow => self.handle_opless_instr("pow"),
                Instruction::Gt => self.handle_opless_instr("gt"),
                Instruction::Ge => self.handle_opless_instr("ge"),
                Instruction::Lt => self.handle_opless_instr("lt"),
                Instruction::Le => self.handle_opless_instr("le"),
                Instruction::Eq => self.handle_opless_instr("eq"),
                Instruction::Ne => self.handle_opless_instr("ne"),
                Instruction::StrictEq => self.handle_opless_instr("stricteq"),
                Instruction::StrictNe => self.handle_opless_instr("strictne"),
                Instruction::BitOr => self.handle_opless_instr("bitor"),
                Instruction::BitXor => self.handle_opless_instr("xor"),
                Instruction::BitAnd => self.handle_opless_instr("bitand"),
                Instruction::BitShl => self.handle_opless_instr("shl"),
                Instruction::BitShr => self.handle_opless_instr("shr"),
                Instruction::BitUshr => self.handle_opless_instr("ushr"),
                Instruction::ObjIn => self.handle_opless_instr("objin"),
                Instruction::InstanceOf => self.handle_opless_instr("instanceof"),
                Instruction::Pop => self.handle_opless_instr("pop"),
                Instruction::Undef => self.handle_opless_instr("undef"),
                Instruction::Constant => {
                    let id = self.read_u16()?;
                    let constant = self.constant(id)?;
                    if let Constant::Function(fun) = constant {
                        functions.push(Rc::clone(fun));
                    }
                    let display = self.display_constant(constant);
                    self.handle_op_instr("constant", &[&display]);
                }
                Instruction::LdLocal => self.handle_incw_op_instr("ldlocal")?,
                Instruction::LdLocalExt => self.handle_incw_op_instr("ldlocalext")?,
                Instruction::StoreLocal | Instruction::StoreLocalExt => {
                    let id = self.read_u16()?;
                    let kind = self.read_assign_kind()?;
                    let name = match instr {
                        Instruction::StoreLocal => "storelocal",
                        _ => "storelocalext",
                    };
                    self.handle_op_instr(name, &[&id, &format_args!("{kind:?}")]);
                }
                Instruction::LdGlobal => self.handle_ident_instr("ldglobal", instr)?,
                Instruction::StoreGlobal => {
                    let ident = self.read_ident(instr)?;
                    let kind = self.read_assign_kind()?;
                    self.handle_op_instr("storeglobal", &[&ident, &format_args!("{kind:?}")]);
                }
                Instruction::DeclareGlobal => self.handle_ident_instr("declareglobal", instr)?,
                Instruction::TypeOfGlobal => self.handle_ident_instr("typeofglobal", instr)?,
                Instruction::Pos => self.handle_opless_instr("pos"),
                Instruction::Neg => self.handle_opless_instr("neg"),
                Instruction::TypeOf => self.handle_opless_instr("typeof"),
                Instruction::BitNot => self.handle_opless_instr("bitnot"),
                Instruction::Not => self.handle_opless_instr("not"),
                Instruction::Ret => {
                    let tc_depth = self.read_u16()?;
                    self.handle_op_map_instr("ret", &[("try_blocks", &tc_depth)]);
                }
                Instruction::Call => {
                    let meta = FunctionCallMetadata::from(self.read()?);
                    self.handle_op_map_instr(
                        "call",
                        &[
                            ("argc", &meta.value()),
                            ("is_constructor_call", &meta.is_constructor_call()),
                            ("is_object_call", &meta.is_object_call()),
                        ],
                    );
                }
                Instruction::Jmp
                | Instruction::JmpFalseP
                | Instruction::JmpFalseNP
                | Instruction::JmpTrueP
                | Instruction::JmpTrueNP
                | Instruction::JmpNullishP
                | Instruction::JmpNullishNP
                | Instruction::Try => {
                    let byte = self.read_i16()?;
                    let offset = (self.reader.offset() as isize) + byte as isize;
                    let arg = format!("@{offset:x}");
                    self.handle_op_instr(
                        match instr {
                            Instruction::Jmp => "jmp",
                            Instruction::JmpFalseP => "jmpfalsep",
                            Instruction::JmpFalseNP => "jmpfalsenp",
                            Instruction::JmpTrueP => "jmptruep",
                            Instruction::JmpTrueNP => "jmptruenp",
                            Instruction::JmpNullishP => "jmpnullishp",
                            Instruction::JmpNullishNP => "jmpnullishnp",
                            _ => "try",
                        },
                        &[&arg],
                    );
                }
                Instruction::StaticPropAccess => {
                    let ident = self.read_ident(instr)?;
                    let preserve_this = self.read()? == 1;
                    self.handle_op_map_instr(
                        "staticpropaccess",
                        &[("property", &ident), ("preserve_this", &preserve_this)],
                    );
                }
                Instruction::DynamicPropAccess => {
                    let b = self.read()?;
                    self.handle_op_map_instr("dynamicpropaccess", &[("preserve_this", &(b == 1))])
                }
                Instruction::StaticPropAssign => {
                    let kind = self.read_assign_kind()?;
                    let ident = self.read_ident(instr)?;
                    self.handle_op_instr("staticpropassign", &[&ident, &format_args!("{kind:?}")]);
                }
                Instruction::DynamicPropAssign => {
                    let kind = self.read_assign_kind()?;
                    self.handle_op_instr("dynamicpropassign", &[&format_args!("{kind:?}")]);
                }
                Instruction::DeletePropertyDynamic => self.handle_opless_instr("deletepropertydynamic"),
                Instruction::ArrayLit => self.handle_incw_op_instr("arraylit")?,
                Instruction::ObjLit => {
                    let len = self.read_u16()?;
                    let mut props = Vec::with_capacity(usize::from(len));
                    for _ in 0..len {
                        let kind =
                            ObjectMemberKind::from_repr(self.read()?).ok_or(DecompileError::InvalidObjectMemberKind)?;

                        match kind {
                            ObjectMemberKind::Static => props.push(self.read_ident(instr)?.to_owned()),
                            ObjectMemberKind::Dynamic => props.push(String::from("<dynamic>")),
                        }
                    }
                    let props = props.iter().map(|v| v as &dyn fmt::Display).collect::<Vec<_>>();
                    self.handle_op_instr("objlit", &props);
                }
                Instruction::This => self.handle_opless_instr("this"),
                Instruction::NewTarget => self.handle_opless_instr("newtarget"),
                Instruction::Global => self.handle_opless_instr("global"),
                Instruction::TryEnd => self.handle_opless_instr("tryend"),
                Instruction::Throw => self.handle_opless_instr("throw"),
                Instruction::Debugger => self.handle_opless_instr("debugger"),
            }
        }

        // Finally, append all other functions defined in this function

        for fun in functions {
            let name = format!("{}::{}", self.name, self.function_name(fun.name));
            let out = FunctionDecompiler::new(self.interner, &fun.buffer, &fun.constants, &name).run()?;
            self.out.push('\n');
            self.out.push_str(&out);
        }

        Ok(self.out)
    }
}
