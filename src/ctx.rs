//! The compilation context: the pipeline's global mutable state (options,
//! message sink, file table) is bundled into one value passed explicitly
//! through every phase, rather than living in
//! module-level statics or thread-locals. Concurrent mutation of a `Ctx` is
//! not supported — the pipeline is single-threaded and cooperative (§5).

use crate::base::FileTable;
use crate::compile::CompileOptions;
use crate::diag::MessageSink;
use crate::model::Model;

pub struct Ctx<'a> {
    pub model: &'a mut Model,
    pub messages: &'a mut MessageSink,
    pub files: &'a mut FileTable,
    pub options: &'a CompileOptions,
}

impl<'a> Ctx<'a> {
    pub fn new(
        model: &'a mut Model,
        messages: &'a mut MessageSink,
        files: &'a mut FileTable,
        options: &'a CompileOptions,
    ) -> Self {
        Self {
            model,
            messages,
            files,
            options,
        }
    }

    pub fn reborrow(&mut self) -> Ctx<'_> {
        Ctx {
            model: self.model,
            messages: self.messages,
            files: self.files,
            options: self.options,
        }
    }
}
