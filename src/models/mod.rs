//! Data models for Libris

pub mod book;
pub mod category;
pub mod loan;
pub mod reader;
pub mod staff;

// Re-export commonly used types
pub use book::{Book, BookDetails, BookShort};
pub use category::Category;
pub use loan::{IssueCheck, Loan, LoanDetails};
pub use reader::{ActiveReader, Membership, Reader, ReaderKey, ReaderMatch};
pub use staff::{StaffAccount, StaffClaims};
