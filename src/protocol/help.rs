//! Interactive `help` command text, one line per command.

pub const HELP_LINES: &[&str] = &[
    "get - operation to get cached value if it exists. Ex. get key",
    "set - operation to set a new cached string value. Ex. set key value [ttl]",
    "update - operation to exchange an existing cached string value. Ex. update key oldValue newValue [ttlInSeconds]",
    "delete - operation to remove an existing cached value. Ex. delete key [value]",
    "exit - operation to close the connection with the server. Ex. exit",
    "lget - operation to get a value from cached list. Ex. lget key index",
    "lappend - operation to add a new value into the cached list. Ex. lappend key value [ttlInSeconds]",
    "ldelete - operation to remove a value from a list by index. Ex. ldelete key index",
    "lsize - operation to check the size of a list. Ex. lsize key",
    "dget - operation to get a value from cached dictionary by key. Ex. dget key dictKey",
    "dset - operation to set a key-value pair into a cached dictionary. Ex. dset key dictKey dictValue",
    "dappend - operation to add a value to the dictionary. Ex. dappend key dictKey value [ttlInSeconds]",
    "ddelete - operation to remove a value from cached dictionary. Ex. ddelete key dictKey",
    "keys - operation to display cached keys. Ex. keys [startIndex] [stopIndex]",
    "ttl - operation to update time to live attribute of any cached value. Ex. ttl key ttlInSeconds",
];

pub const NEED_HELP: &str = "Please use \"help\" command to find the available commands.";
