//! News record supply port.

use crate::domain::error::SentipriceError;
use crate::domain::news::NewsEvent;

pub trait NewsPort {
    fn load_news(&self) -> Result<Vec<NewsEvent>, SentipriceError>;
}
