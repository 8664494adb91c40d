//! Read-side queries over the order board.

pub mod started_board;

pub use started_board::{
    BoardKpis, BoardQuery, BoardRow, PlateGroup, SortKey, StatusFilter, board_kpis, started_board,
};
