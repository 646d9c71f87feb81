mod parser;
mod types;

pub use self::parser::{encode_attribute, interpret_attribute};
pub use self::types::*;

use crate::constant_info::ConstantPool;
use crate::error::{Location, Result};
use crate::InterpretInner;

impl AttributeInfo {
    /// Builds an attribute from its structured form, encoding the payload.
    pub fn from_parsed(attribute_name_index: u16, variant: AttributeInfoVariant) -> Result<Self> {
        Ok(AttributeInfo {
            attribute_name_index,
            info: encode_attribute(&variant)?,
            info_parsed: Some(variant),
        })
    }

    /// Re-encodes `info` from `info_parsed`, nested attributes first.
    pub fn sync_from_parsed(&mut self) -> Result<()> {
        let Some(variant) = &mut self.info_parsed else {
            return Ok(());
        };
        match variant {
            AttributeInfoVariant::Code(code) => {
                for attr in &mut code.attributes {
                    attr.sync_from_parsed()?;
                }
            }
            AttributeInfoVariant::Record(record) => {
                for attr in record
                    .components
                    .iter_mut()
                    .flat_map(|c| c.attributes.iter_mut())
                {
                    attr.sync_from_parsed()?;
                }
            }
            _ => {}
        }
        self.info = encode_attribute(variant)?;
        Ok(())
    }
}

impl InterpretInner for AttributeInfo {
    fn interpret_inner(&mut self, const_pool: &ConstantPool) -> Result<()> {
        let name = const_pool.utf8(self.attribute_name_index).map_err(|e| {
            e.at(Location::Attribute {
                name: format!("#{}", self.attribute_name_index),
                owner: None,
            })
        })?;
        self.info_parsed = interpret_attribute(&name, &self.info)?;
        match &mut self.info_parsed {
            Some(AttributeInfoVariant::Code(code)) => {
                for attr in &mut code.attributes {
                    attr.interpret_inner(const_pool)?;
                }
            }
            Some(AttributeInfoVariant::Record(record)) => {
                for attr in record
                    .components
                    .iter_mut()
                    .flat_map(|c| c.attributes.iter_mut())
                {
                    attr.interpret_inner(const_pool)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}
