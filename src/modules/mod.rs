pub mod perception;
pub mod brain;
