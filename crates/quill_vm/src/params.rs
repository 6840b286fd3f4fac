use quill_optimizer::OptLevel;

use crate::Vm;

pub type PrintCallback = fn(vm: &mut Vm, line: &str);

pub const DEFAULT_MAX_FRAMES: usize = 1024;
pub const DEFAULT_MAX_REENTRY: usize = 64;

#[derive(Debug, Clone)]
pub struct VmParams {
    max_frames: usize,
    max_reentry: usize,
    print_callback: Option<PrintCallback>,
    opt_level: OptLevel,
}

impl Default for VmParams {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            max_reentry: DEFAULT_MAX_REENTRY,
            print_callback: None,
            opt_level: OptLevel::default(),
        }
    }
}

impl VmParams {
    pub fn new() -> Self {
        VmParams::default()
    }

    /// Sets the call depth at which a `RangeError` is thrown
    pub fn set_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Sets how deeply native functions such as `Function.prototype.call` may re-enter the interpreter.
    /// Every re-entry uses native stack, unlike calls between script functions.
    pub fn set_max_reentry(mut self, max_reentry: usize) -> Self {
        self.max_reentry = max_reentry;
        self
    }

    pub fn max_reentry(&self) -> usize {
        self.max_reentry
    }

    /// Sets the sink of `print` and `console.log`. Lines go to stdout if unset.
    pub fn set_print_callback(mut self, callback: PrintCallback) -> Self {
        self.print_callback = Some(callback);
        self
    }

    pub fn print_callback(&self) -> Option<PrintCallback> {
        self.print_callback
    }

    /// Sets the optimization level for code compiled at runtime by `eval`
    pub fn set_opt_level(mut self, opt_level: OptLevel) -> Self {
        self.opt_level = opt_level;
        self
    }

    pub fn opt_level(&self) -> OptLevel {
        self.opt_level
    }
}
