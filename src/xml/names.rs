//! Element and attribute names of the KDBX XML vocabulary used here.

pub const ELEM_TIMES: &str = "Times";
pub const ELEM_CREATION_TIME: &str = "CreationTime";
pub const ELEM_LAST_MOD_TIME: &str = "LastModificationTime";
pub const ELEM_LAST_ACCESS_TIME: &str = "LastAccessTime";
pub const ELEM_EXPIRY_TIME: &str = "ExpiryTime";
pub const ELEM_EXPIRES: &str = "Expires";
pub const ELEM_USAGE_COUNT: &str = "UsageCount";
pub const ELEM_LOCATION_CHANGED: &str = "LocationChanged";

pub const ELEM_DELETED_OBJECTS: &str = "DeletedObjects";
pub const ELEM_DELETED_OBJECT: &str = "DeletedObject";
pub const ELEM_UUID: &str = "UUID";
pub const ELEM_DELETION_TIME: &str = "DeletionTime";

pub const ELEM_CUSTOM_DATA: &str = "CustomData";
pub const ELEM_STRING_DICT_EX_ITEM: &str = "Item";
pub const ELEM_KEY: &str = "Key";
pub const ELEM_VALUE: &str = "Value";

pub const ATTR_PROTECTED: &str = "Protected";
pub const ATTR_PROTECTED_IN_MEM_PLAIN_XML: &str = "ProtectInMemory";
pub const ATTR_REF: &str = "Ref";
pub const ATTR_COMPRESSED: &str = "Compressed";

pub const VAL_TRUE: &str = "True";
pub const VAL_FALSE: &str = "False";
pub const VAL_NULL: &str = "null";
