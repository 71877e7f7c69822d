pub mod catalog;
pub mod criteria;
pub mod labels;
pub mod lead;
pub mod recommendation;
pub mod validation;
