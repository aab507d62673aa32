//! Node flags packed into the 16-bit `Node::flags` field.

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u16 {
        /// `let` declaration list
        const LET = 1 << 0;
        /// `const` declaration list
        const CONST = 1 << 1;
        /// Created by a rewrite pass rather than the parser
        const SYNTHESIZED = 1 << 2;
        /// Object or array literal written across several lines
        const MULTI_LINE = 1 << 3;
        const BLOCK_SCOPED = Self::LET.bits() | Self::CONST.bits();
    }
}
