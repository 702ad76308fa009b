// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Code section loading from object files

use object::{Object, ObjectSection};

use crate::error::LoadError;

/// Section names searched for code, in order.
pub const CODE_SECTIONS: &[&str] = &[
    "__text", // Mach-O
    ".text",  // ELF, COFF
];

/// Returns the bytes of the code section of an object file.
pub fn code_section(data: &[u8]) -> Result<&[u8], LoadError> {
    let file = object::File::parse(data).map_err(LoadError::Parse)?;

    let section = CODE_SECTIONS
        .iter()
        .find_map(|name| file.section_by_name(name))
        .ok_or(LoadError::MissingCodeSection)?;

    section.data().map_err(LoadError::SectionData)
}
