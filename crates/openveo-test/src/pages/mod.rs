//! Page objects of the back office.
//!
//! Pages are assembled from capabilities instead of a class hierarchy:
//!
//! - [`Page`] navigates to a path and checks the browser landed on it
//! - [`BackEnd`] logs users in and out, drives the left menu, the alerts and
//!   the interface language
//! - [`Table`] drives the data table of CRUD pages
//!
//! [`BackEndPage`] and [`TablePage`] bundle them for the common cases. A
//! concrete table page plugs its forms in through [`TableForms`].

mod back_end;
mod page;
mod table;

pub use self::back_end::{BackEnd, BackEndPage, Language, LANGUAGES};
pub use self::page::Page;
pub use self::table::{
    lines_in_page, page_link_number, Line, LineTarget, NoForms, Table, TableForms, TablePage,
    REMOVE_ACTION_KEY,
};
