use super::attributes::Scope;
use super::ClassRemapper;
use crate::attribute_info::CodeAttribute;
use crate::code_attribute::{patch_operand, pool_operands};
use crate::error::{Location, Result};

impl ClassRemapper<'_> {
    /// Points every pool operand of the bytecode, and every catch type, at the
    /// entry that now stands for it. Instruction lengths never change.
    pub(super) fn remap_code(&mut self, code: &mut CodeAttribute, method: &str) -> Result<()> {
        let at = |offset: usize| Location::Code {
            method: method.to_string(),
            offset,
        };
        for operand in pool_operands(&code.code)? {
            self.original
                .resolve(operand.index)
                .map_err(|e| e.at(at(operand.pc)))?;
            let index = self.redirect(operand.index);
            if index != operand.index {
                patch_operand(&mut code.code, &operand, index).map_err(|e| e.at(at(operand.pc)))?;
            }
        }
        for entry in &mut code.exception_table {
            if entry.catch_type != 0 {
                entry.catch_type = self.redirect(entry.catch_type);
            }
        }
        self.remap_attributes(&mut code.attributes, &Scope::Code { method })
    }
}
