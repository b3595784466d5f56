mod routing;
mod validation;
