//! Contract interfaces the action providers call

use alloy::primitives::{address, Address};
use alloy::sol;
use chainbot_error::{Error, Result};

/// WETH predeploy on Base (OP Stack)
pub const WETH_ADDRESS: Address = address!("0x4200000000000000000000000000000000000006");

sol! {
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function transfer(address to, uint256 amount) external returns (bool);
    }

    interface IWETH {
        function deposit() external payable;
    }
}

/// Parse a `0x`-prefixed address; checksums are not enforced
pub fn parse_address(value: &str) -> Result<Address> {
    let trimmed = value.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(Error::invalid_address(value));
    }
    trimmed
        .parse::<Address>()
        .map_err(|_| Error::invalid_address(value))
}
